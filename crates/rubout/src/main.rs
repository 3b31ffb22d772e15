use anyhow::Context;
use geo::{Coord, LineString, MultiPolygon, Polygon};
use rubout::*;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let operation = args.get(1).map(|s| s.as_str()).unwrap_or("clear");

    match operation {
        "clear" => demo_clear(),
        "rest" => demo_rest(),
        "isolation" => demo_isolation(),
        _ => {
            println!("Usage: rubout [clear|rest|isolation]");
            println!("  clear      - Single-pass copper clearing around two pads (default)");
            println!("  rest       - Rest machining with a coarse and a fine tool");
            println!("  isolation  - Isolation envelope around a pad");
            Ok(())
        }
    }
}

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
        vec![],
    )
}

fn round_pad(x: f64, y: f64, radius: f64) -> Polygon<f64> {
    Polygon::new(
        circle_ring(Coord { x, y }, radius, CIRCLE_SEGMENTS),
        vec![],
    )
}

fn print_outcome(outcome: &JobOutcome, pool: &[Tool]) {
    for (id, paths) in &outcome.tool_paths {
        let name = pool
            .iter()
            .find(|tool| &tool.id == id)
            .map(|tool| tool.name.as_str())
            .unwrap_or("?");
        println!("  {:>8}: {} path(s)", name, paths.len());
    }
    println!(
        "  cleared area: {:.2} mm^2",
        geo::Area::unsigned_area(&outcome.cleared_union)
    );
    if !outcome.warnings.is_clean() {
        println!(
            "  warnings: {} broken isolation, {} failed polygon(s)",
            outcome.warnings.broken_isolation,
            outcome.warnings.failed_polygons.len()
        );
    }
}

fn demo_clear() -> anyhow::Result<()> {
    println!("rubout - single-pass copper clearing");
    println!("====================================\n");

    // Two rectangular pads and one round pad on a small board region.
    let copper = MultiPolygon(vec![
        rect(0.0, 0.0, 10.0, 10.0),
        rect(15.0, 2.0, 22.0, 8.0),
        round_pad(28.0, 5.0, 3.0),
    ]);

    let pool = vec![Tool::new("1mm flat", 1.0).with_overlap(0.4)];
    let config = JobConfig::new().with_margin(2.0);

    let outcome = ClearJob::new(config, pool.clone())
        .run(&copper)
        .context("single-pass clearing failed")?;
    println!("Cleared with {} tool(s):", outcome.tool_count());
    print_outcome(&outcome, &pool);
    Ok(())
}

fn demo_rest() -> anyhow::Result<()> {
    println!("rubout - rest machining");
    println!("=======================\n");

    // Copper plate with a slot only the fine tool can enter.
    let copper = MultiPolygon(vec![
        rect(0.0, 0.0, 4.4, 10.0),
        rect(5.6, 0.0, 10.0, 10.0),
        rect(0.0, 0.0, 10.0, 3.0),
    ]);

    let pool = vec![
        Tool::new("2mm flat", 2.0).with_overlap(0.4),
        Tool::new("0.5mm flat", 0.5).with_overlap(0.4),
    ];
    let config = JobConfig::new().with_margin(3.0).with_rest_machining(true);

    let job = ClearJob::new(config, pool.clone()).with_progress(Box::new(|p: JobProgress| {
        println!(
            "  tool {}/{}: {}/{} polygon(s), {:.0}%",
            p.tool_index + 1,
            p.tool_count,
            p.polygons_done,
            p.polygon_count,
            p.percent()
        );
    }));
    let outcome = job.run(&copper).context("rest machining failed")?;
    println!("Cleared with {} tool(s):", outcome.tool_count());
    print_outcome(&outcome, &pool);
    Ok(())
}

fn demo_isolation() -> anyhow::Result<()> {
    println!("rubout - isolation envelope");
    println!("===========================\n");

    let copper = MultiPolygon(vec![rect(0.0, 0.0, 10.0, 10.0), round_pad(16.0, 5.0, 2.5)]);
    let envelope = isolation_envelope(&copper, 0.15, MillingDirection::Climb)
        .context("isolation envelope failed")?;

    println!("Generated {} isolation ring(s):", envelope.rings.len());
    for (index, ring) in envelope.rings.iter().enumerate() {
        println!("  ring {}: {} vertex(es)", index, ring.points().0.len());
    }
    Ok(())
}
