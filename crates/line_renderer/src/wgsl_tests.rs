use crate::variant::ProgramVariant;

#[test]
fn line_wgsl_parses_successfully() {
    parse_wgsl("line.wgsl", crate::LINE_SHADER_SOURCE);
}

#[test]
fn every_program_variant_has_its_entry_points() {
    let module = parse_wgsl("line.wgsl", crate::LINE_SHADER_SOURCE);
    let names: Vec<&str> = module
        .entry_points
        .iter()
        .map(|entry_point| entry_point.name.as_str())
        .collect();
    for variant in ProgramVariant::ALL {
        let (vertex, fragment) = variant.entry_points();
        assert!(
            names.contains(&vertex),
            "{} is missing vertex entry point {vertex}",
            variant.label()
        );
        assert!(
            names.contains(&fragment),
            "{} is missing fragment entry point {fragment}",
            variant.label()
        );
    }
}

fn parse_wgsl(label: &str, source: &str) -> naga::Module {
    naga::front::wgsl::parse_str(source).unwrap_or_else(|error| {
        panic!(
            "WGSL parse failed for {label}: {}",
            error.emit_to_string(source)
        )
    })
}
