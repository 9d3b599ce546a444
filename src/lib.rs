pub mod amod;
pub mod cli;
pub mod issues;
pub mod model;
pub mod numbers;
pub mod writer;

use std::io::Write;

use anyhow::{Context, bail};
use clap::Parser;

use writer::Framework;

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let frameworks = select_frameworks(&args.framework)?;

    // 1. ── Compile ────────────────────────────────────────────────────
    let src = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Reading {}", args.input.display()))?;

    let mut log = issues::Log::new();
    let model = amod::generate_model(&src, &mut log);

    report_issues(&log, args.json)?;

    let Some(model) = model else {
        bail!("failed to compile {}", args.input.display());
    };

    tracing::info!(model = %model.name, "compiled");

    // 2. ── Generate code ──────────────────────────────────────────────
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Creating {}", args.output.display()))?;

    let mut initial_buffers = writer::InitialBuffers::new();
    if let Some(goal) = &args.goal {
        initial_buffers.insert("goal".to_string(), goal.clone());
    }

    for framework in frameworks {
        let framework_log = framework.validate_model(&model);
        report_issues(&framework_log, args.json)?;

        let code = framework
            .emit(&model, &initial_buffers)
            .with_context(|| format!("Generating {framework} code"))?;

        let file_name = args.output.join(framework.output_file_name(&model));
        std::fs::write(&file_name, code)
            .with_context(|| format!("Writing {}", file_name.display()))?;
        tracing::info!(file = %file_name.display(), "wrote model");

        for (support_name, contents) in framework.support_files(&model) {
            let support_path = args.output.join(support_name);
            std::fs::write(&support_path, contents)
                .with_context(|| format!("Writing {}", support_path.display()))?;
            tracing::info!(file = %support_path.display(), "wrote support file");
        }
    }

    Ok(())
}

/// Expand the `--framework` arguments ("all" or named) into the list to
/// generate for.
fn select_frameworks(names: &[String]) -> anyhow::Result<Vec<Framework>> {
    let mut frameworks = Vec::new();

    for name in names {
        if name == "all" {
            return Ok(Framework::ALL.to_vec());
        }

        match Framework::from_name(name) {
            Some(framework) if !frameworks.contains(&framework) => frameworks.push(framework),
            Some(_) => {}
            None => bail!("invalid framework name: \"{name}\""),
        }
    }

    Ok(frameworks)
}

fn report_issues(log: &issues::Log, as_json: bool) -> anyhow::Result<()> {
    if !log.has_issues() {
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    if as_json {
        serde_json::to_writer_pretty(&mut stdout, log.all_issues())
            .context("Serializing issues")?;
        writeln!(stdout)?;
    } else {
        log.write(&mut stdout).context("Writing issues")?;
    }

    Ok(())
}
