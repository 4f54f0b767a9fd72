use clap::Parser;
use clinical_form::commands::{Command, HELP};
use clinical_form::render::to_terminal;
use clinical_form::{
    ClinicalForm, DEFAULT_ENDPOINT, FileSlot, HttpPredictionClient, QuerySubmitter, Submission,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{Level, error};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "clinical-form")]
#[command(about = "Attach clinical files, ask a question, read the suggestions")]
struct Args {
    /// Prediction endpoint that answers `POST {"query": ...}`
    #[arg(long, env = "PREDICTION_URL", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Diagnostics go to stderr so they never mix with the form on stdout
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let form = ClinicalForm::new();
    let submitter = QuerySubmitter::new(HttpPredictionClient::new(args.endpoint.clone()));

    print_banner(&args.endpoint);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Option<JoinHandle<Submission>> = None;

    loop {
        tokio::select! {
            settled = async {
                match pending.as_mut() {
                    Some(handle) => handle.await,
                    None => std::future::pending().await,
                }
            }, if pending.is_some() => {
                pending = None;
                match settled {
                    Ok(_) => print_response(&form),
                    Err(e) => error!("Submission task failed: {}", e),
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        if let Some(handle) = apply(command, &form, &submitter) {
                            pending = Some(handle);
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
        }
    }

    Ok(())
}

fn apply(
    command: Command,
    form: &ClinicalForm,
    submitter: &QuerySubmitter<HttpPredictionClient>,
) -> Option<JoinHandle<Submission>> {
    match command {
        Command::SelectFile(slot, file) => {
            match &file {
                Some(file) => println!("{}: {}", slot.label(), file.name()),
                None => println!("{}: cleared", slot.label()),
            }
            form.set_file(slot, file);
        }
        Command::Query(query) => form.set_query(query),
        Command::Submit => {
            if form.is_in_flight() {
                println!("Still analyzing the previous query...");
                return None;
            }
            let handle = submitter.spawn(form);
            if form.is_in_flight() {
                println!("Analyzing...");
            }
            return Some(handle);
        }
        Command::Show => print_form(form),
        Command::Help => println!("{HELP}"),
        Command::Quit => {}
    }
    None
}

fn print_banner(endpoint: &str) {
    println!("Automated Clinical Decision System");
    println!("==================================");
    println!("Upload clinical data and ask questions to receive AI-powered suggestions.");
    println!("Prediction endpoint: {endpoint}");
    println!();
    println!("{HELP}");
    println!();
}

fn print_form(form: &ClinicalForm) {
    let state = form.snapshot();
    for slot in FileSlot::ALL {
        let file = state
            .file(slot)
            .map(|f| f.path().display().to_string())
            .unwrap_or_else(|| "(none)".to_string());
        println!("{:<18} [{}] {}", slot.label(), slot.accept(), file);
    }
    println!("Clinical query:    {}", state.query);
    if state.in_flight {
        println!("Status:            analyzing...");
    }
    println!();
    print_response(form);
}

fn print_response(form: &ClinicalForm) {
    println!("Response");
    println!("────────");
    println!("{}", to_terminal(&form.display_response()));
    println!();
}
