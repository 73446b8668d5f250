use anyhow::{Context, bail};
use std::env;
use std::fs;
use vrpconf::config::{ReconcileOptions, SaveWhen};
use vrpconf::intent::Intent;
use vrpconf::reconciler::Reconciler;
use vrpconf::script::CommandScript;

fn print_usage() {
    eprintln!(
        "Usage: cargo run --example plan_from_files -- <intents.json> <running.cfg> [--check] [--save-when always|changed|never]"
    );
}

fn parse_options(flags: &[String]) -> anyhow::Result<ReconcileOptions> {
    let mut options = ReconcileOptions::default();
    let mut flags = flags.iter();
    while let Some(flag) = flags.next() {
        match flag.as_str() {
            "--check" => options.check_mode = true,
            "--save-when" => {
                let value = flags.next().context("--save-when needs a value")?;
                let save_when: SaveWhen = serde_json::from_value(value.as_str().into())
                    .with_context(|| format!("invalid save policy '{value}'"))?;
                options.save_when = save_when;
            }
            unknown => bail!("unknown flag: {unknown}"),
        }
    }
    Ok(options)
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        print_usage();
        std::process::exit(2);
    }

    let options = parse_options(&args[3..])?;
    let intents_json = fs::read_to_string(&args[1])
        .with_context(|| format!("failed to read intents file '{}'", args[1]))?;
    let intents: Vec<Intent> =
        serde_json::from_str(&intents_json).context("intents file is not a JSON list")?;
    let running = fs::read_to_string(&args[2])
        .with_context(|| format!("failed to read running config '{}'", args[2]))?;

    let reconciler = Reconciler::builtin();
    let result = reconciler.reconcile_text(&intents, &running, &options)?;

    print!("{result}");
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.changed && !result.saved {
        println!("nothing to do");
        return Ok(());
    }

    let script = CommandScript::from_diff(&result, vrpconf::render::RENDERER.undo_rules())?;
    for (idx, step) in script.steps.iter().enumerate() {
        println!("  step[{idx}] view={:?} command={}", step.view, step.command);
    }
    if script.dry_run {
        println!("check mode: script not executed");
    }
    Ok(())
}
