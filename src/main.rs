use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use farmrisk::client::{HttpPredictClient, PredictClient};
use farmrisk::config::Config;
use farmrisk::dashboard::{dispatch, Flow, RiskDashboard, Ticket};
use farmrisk::form::load_form;
use farmrisk::logging::{log, obj, v_str, Domain, Level};
use farmrisk::model::{Prediction, RiskInput};
use farmrisk::simulation::Sliders;
use farmrisk::term::render_screen;
use farmrisk::view::Panel;

#[derive(Debug, PartialEq)]
enum Command {
    Set(String, String),
    Submit,
    Slider(String, f64),
    Simulate,
    Show(Panel),
    Advanced,
    Click(u64),
    Reset,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let cmd = parts.next()?;
    match cmd {
        "set" => {
            let key = parts.next()?.to_string();
            let value = parts.collect::<Vec<_>>().join(" ");
            Some(Command::Set(key, value))
        }
        "submit" => Some(Command::Submit),
        "slider" => {
            let name = parts.next()?.to_string();
            let value = parts.next()?.parse().ok()?;
            Some(Command::Slider(name, value))
        }
        "simulate" => Some(Command::Simulate),
        "show" => Panel::parse(parts.next()?).map(Command::Show),
        "advanced" => Some(Command::Advanced),
        "click" => parts.next()?.parse().ok().map(Command::Click),
        "reset" => Some(Command::Reset),
        "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

fn default_form() -> RiskInput {
    let mut form = RiskInput::new();
    for (k, v) in [
        ("Season", "NORMAL"),
        ("Crop_Type", "Wheat"),
        ("Region", "Normal"),
        ("Water_Source", "Rainfed"),
        ("Insurance", "No"),
        ("Rainfall_Deviation", "0"),
        ("Market_Volatility", "0.2"),
        ("Input_Cost", "40000"),
        ("Loan_Amount", "100000"),
        ("Storage_Access", "0"),
        ("Income_Stability", "Stable"),
    ] {
        form.set_text(k, v);
    }
    form
}

type Outcome = (Ticket, Result<Prediction>);

fn spawn_request(client: Arc<HttpPredictClient>, ticket: Ticket, tx: mpsc::UnboundedSender<Outcome>) {
    tokio::spawn(async move {
        let outcome = dispatch(client.as_ref(), &ticket).await;
        let _ = tx.send((ticket, outcome));
    });
}

fn redraw(dash: &RiskDashboard, form: &RiskInput, sliders: &Sliders) {
    println!("{}", render_screen(dash, form, sliders));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let client = Arc::new(HttpPredictClient::new(&cfg)?);
    let mut form = match std::env::args().nth(1) {
        Some(path) => load_form(Path::new(&path)).context("loading form file")?,
        None => default_form(),
    };
    let mut sliders = Sliders::default();
    let mut dash = RiskDashboard::new(&cfg);

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[("endpoint", v_str(client.endpoint()))]),
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<Outcome>();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(cfg.tick());

    redraw(&dash, &form, &sliders);
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else { break };
                let Some(cmd) = parse_command(&line) else {
                    eprintln!("unknown command: {}", line.trim());
                    continue;
                };
                match cmd {
                    Command::Quit => break,
                    Command::Set(key, value) => form.set_text(&key, &value),
                    Command::Submit => {
                        if dash.busy(Flow::Submit) {
                            eprintln!("analysis already running");
                            continue;
                        }
                        let ticket = dash.begin_submit(form.clone());
                        spawn_request(client.clone(), ticket, tx.clone());
                    }
                    Command::Slider(name, value) => match sliders.by_name(&name) {
                        Some(slider) => slider.set(value),
                        None => eprintln!("unknown slider: {}", name),
                    },
                    Command::Simulate => {
                        if dash.busy(Flow::Simulate) {
                            eprintln!("simulation already running");
                            continue;
                        }
                        match dash.begin_simulation(&form, &sliders) {
                            Ok(ticket) => spawn_request(client.clone(), ticket, tx.clone()),
                            Err(blocked) => eprintln!("{}", blocked.notice()),
                        }
                    }
                    Command::Show(panel) => dash.router_mut().show(panel),
                    Command::Advanced => {
                        dash.router_mut().toggle_advanced();
                    }
                    Command::Click(id) => {
                        if !dash.click_popup(id) {
                            eprintln!("no popup {}", id);
                        }
                    }
                    Command::Reset => dash.reset(),
                }
                redraw(&dash, &form, &sliders);
            }
            Some((ticket, outcome)) = rx.recv() => {
                match ticket.flow {
                    Flow::Submit => dash.apply_submit(&ticket, outcome, Instant::now()),
                    Flow::Simulate => dash.apply_simulation(&ticket, outcome),
                };
                redraw(&dash, &form, &sliders);
            }
            _ = ticker.tick() => {
                if dash.tick(Instant::now()) > 0 {
                    redraw(&dash, &form, &sliders);
                }
            }
        }
    }

    log(Level::Info, Domain::System, "shutdown", obj(&[]));
    Ok(())
}
