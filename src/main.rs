use clap::Command;
use tracing::info;

use nlsh::executor::Executor;
use nlsh::platform::PlatformKind;
use nlsh::raw_input::CrosstermKeyReader;
use nlsh::repl::Repl;
use nlsh::translator::AiTranslator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    Command::new("nlsh")
        .about("AI-assisted interactive shell - run commands or plain language")
        .long_about(
            "nlsh executes each input line as a shell command and, when that fails, \
             asks an AI completion service to translate the request into one. \
             The proposed command only runs after a single-key confirmation.",
        )
        .get_matches();

    let platform = PlatformKind::detect();
    info!("Detected platform: {:?}", platform);

    // An interrupt anywhere in the session is a controlled exit, not a crash.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nCtrl+C received, exiting.");
            std::process::exit(0);
        }
    });

    let translator = AiTranslator::new(platform)?;
    let mut repl = Repl::new(Executor::new(platform), translator, CrosstermKeyReader);
    repl.run().await
}
