/// Load a page snapshot, print its resolved graph and simulate it.
///
/// Usage: run_page [page.json] [--ticks N] [--set BLOCK=0|1]... [--live]
///
/// Without a page file a start/stop latch circuit is simulated. `--live`
/// drives the page in real time at the configured resolution instead of
/// stepping it as fast as possible.
use logic_sim::core::components::kinds;
use logic_sim::{
    BlockId, EvaluatorRegistry, Page, PageBuilder, SimulationConfig, SimulationDriver, SimulationEngine,
    TickObserver, TickReport,
};
use std::sync::Arc;
use std::time::Duration;

struct Options {
    page: Option<String>,
    ticks: u64,
    signals: Vec<(BlockId, bool)>,
    live: bool,
}

fn parse_args() -> Result<Options, Box<dyn std::error::Error>> {
    let mut options = Options {
        page: None,
        ticks: 10,
        signals: Vec::new(),
        live: false,
    };

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--ticks" => {
                options.ticks = args.next().ok_or("--ticks needs a value")?.parse()?;
            }
            "--set" => {
                let assignment = args.next().ok_or("--set needs BLOCK=0|1")?;
                let (block, value) = assignment.split_once('=').ok_or("--set needs BLOCK=0|1")?;
                let value = matches!(value, "1" | "true" | "on");
                options.signals.push((BlockId::new(block), value));
            }
            "--live" => options.live = true,
            path => options.page = Some(path.to_string()),
        }
    }
    Ok(options)
}

/// Start button sets a latch, stop button resets it, the motor follows the
/// latch after a delay
fn latch_page() -> Result<Page, Box<dyn std::error::Error>> {
    let mut builder = PageBuilder::new("motor");
    let start = builder.add_block(kinds::SIGNAL, &[], &["O"]);
    let stop = builder.add_block(kinds::SIGNAL, &[], &["O"]);
    let latch = builder.add_block(kinds::SR_RESET, &["S", "R"], &["Q"]);
    let delay = builder.add_block(kinds::TIMER_ON, &["I"], &["O"]);
    let lamp = builder.add_block(kinds::INVERTER, &["I"], &["O"]);
    builder.connect(&start, "O", &latch, "S")?;
    builder.connect(&stop, "O", &latch, "R")?;
    builder.connect(&latch, "Q", &delay, "I")?;
    builder.connect_inverted(&latch, "Q", &lamp, "I", true, false)?;
    Ok(builder.build())
}

fn print_report(report: &TickReport) {
    let outputs: Vec<String> = report
        .outputs
        .iter()
        .map(|(block, value)| format!("{}={}", block, u8::from(*value)))
        .collect();
    println!("cycle {:>4}: {}", report.cycle, outputs.join(" "));
}

struct PrintObserver;

impl TickObserver for PrintObserver {
    fn on_tick(&self, report: &TickReport) {
        print_report(report);
    }

    fn on_fault(&self, error: &logic_sim::SimulationError) {
        eprintln!("simulation fault: {}", error);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let options = parse_args()?;
    let page = match &options.page {
        Some(path) => Page::from_json(&std::fs::read_to_string(path)?)?,
        None => latch_page()?,
    };

    let config = SimulationConfig::default().with_timer_duration(Duration::from_millis(300));
    let registry = EvaluatorRegistry::with_builtins(&config);

    if options.live {
        let mut driver = SimulationDriver::new(Arc::new(registry), config.clone(), Arc::new(PrintObserver));
        driver.start(&page)?;
        for (block, value) in &options.signals {
            driver.set_signal(block, *value)?;
        }
        let period = u32::try_from(options.ticks).unwrap_or(u32::MAX);
        tokio::time::sleep(config.resolution.saturating_mul(period)).await;
        driver.stop().await?;
        return Ok(());
    }

    let mut engine = SimulationEngine::new(&page, &registry, &config)?;
    print!("{}", engine.context().dump());
    for (block, value) in &options.signals {
        engine.set_signal(block, *value)?;
    }
    for _ in 0..options.ticks {
        print_report(&engine.step()?);
    }
    Ok(())
}
