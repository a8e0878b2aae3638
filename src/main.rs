use std::io::Write;
use std::thread;
use std::time::Instant;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use elevatorfleet::event::Event;
use elevatorfleet::fleet::Fleet;
use elevatorfleet::init;
use elevatorfleet::print;


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = init::parse_args();
    let config = init::load_config(args.config_path.as_deref())?;
    let start = Instant::now();

    /* START ----------- Skriver hendelser til stdout ----------- */
    let (events_tx, events_rx) = crossbeam_channel::unbounded::<Event>();
    let writer = thread::spawn(move || {
        let stdout = std::io::stdout();
        for event in events_rx.iter() {
            let mut out = stdout.lock();
            let _ = writeln!(out, "[{:>10.4}]{}", start.elapsed().as_secs_f64(), event);
        }
    });
    /* SLUTT ----------- Skriver hendelser til stdout ----------- */

    let fleet = Fleet::start(config, events_tx).context("starting fleet")?;

    /* START ----------- Leser direktiv fra stdin ----------- */
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = match init::parse_record(line) {
            Ok(record) => record,
            Err(e) => {
                print::warn(format!("Line {}: {:#}", line_no, e));
                continue;
            }
        };
        if let Some(at) = record.at {
            tokio::time::sleep_until((start + at).into()).await;
        }
        // Avvist direktiv er allerede logget av dispatcheren
        let _ = fleet.submit(record.directive).await;
    }
    fleet.end_input().await;
    /* SLUTT ----------- Leser direktiv fra stdin ----------- */

    let report = fleet.join().await?;
    print::color(
        format!("{} received, {} arrived", report.received, report.arrived),
        ansi_term::Colour::Cyan,
    );

    if writer.join().is_err() {
        print::err("Event writer panicked".to_string());
    }
    Ok(())
}
