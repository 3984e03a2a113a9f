//! Map a component spec and print the selected part.
//!
//! Usage: cargo run --example map_component -- <type> [value] [package]

use partmap::prelude::*;

#[tokio::main]
async fn main() -> Result<(), PartmapError> {
    let mut args = std::env::args().skip(1);
    let component_type = args.next().unwrap_or_else(|| "resistor".to_string());

    let mut spec = ComponentSpec::new(component_type);
    if let Some(value) = args.next() {
        spec = spec.with_value(value);
    }
    if let Some(package) = args.next() {
        spec = spec.with_package(package);
    }
    spec.validate()?;

    let mapper = ComponentMapper::new(&MapperConfig::from_env())?;
    for status in mapper.federation().get_status() {
        println!(
            "supplier {:<10} {}",
            status.name,
            if status.available { "configured" } else { "not configured" }
        );
    }
    println!();

    let result = mapper.map_component(&spec).await;

    println!("Request:      {}", spec);
    println!("MPN:          {}", result.primary.mpn);
    println!("Manufacturer: {}", result.primary.manufacturer);
    println!("Supplier:     {} ({})", result.primary.supplier, result.primary.supplier_pn);
    println!("Package:      {}", result.primary.package);
    println!("Confidence:   {:.2}", result.confidence);

    if !result.alternatives.is_empty() {
        println!();
        println!("Alternatives:");
        for alt in &result.alternatives {
            println!("  - {} from {} ({})", alt.mpn, alt.supplier, alt.supplier_pn);
        }
    }

    for warning in &result.warnings {
        println!("warning: {}", warning);
    }

    Ok(())
}
