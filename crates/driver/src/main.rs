use std::{
    fs,
    io::{self, BufWriter, Write},
    path::PathBuf,
    process,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use tracing::error;

use linkgroup_cli_support::{logging, GroupsOpts, InputOpts};
use linkgroup_engine::{assign, collect_roots, Resolution};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(name = "linkgroup", version = "0.0.0")]
struct Opts {
    /// Enable debug level logging
    #[clap(long = "debug-self", global = true)]
    debug: bool,

    #[clap(subcommand)]
    sub_command: SubCommand,
}

#[derive(Subcommand)]
enum SubCommand {
    /// Assign every target of a graph to a link group and write the resulting report as JSON
    Assign(AssignOpts),
    /// Print the members of each link group
    Members(MembersOpts),
    /// Print every root referenced by the group definitions
    Roots(RootsOpts),
}

#[derive(Parser, Debug)]
pub struct AssignOpts {
    #[clap(flatten)]
    input: InputOpts,

    /// Where to write the report. Defaults to stdout.
    #[clap(long, short)]
    output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct MembersOpts {
    #[clap(flatten)]
    input: InputOpts,
}

#[derive(Parser, Debug)]
pub struct RootsOpts {
    #[clap(flatten)]
    groups: GroupsOpts,
}

fn main() {
    let opts = Opts::parse();

    if let Err(err) = logging::init(opts.debug) {
        eprintln!("failed to initialize logging: {:#}", err);
        process::exit(1);
    }

    let result = match &opts.sub_command {
        SubCommand::Assign(assign_opts) => run_assign(assign_opts),
        SubCommand::Members(members_opts) => members(members_opts),
        SubCommand::Roots(roots_opts) => roots(roots_opts),
    };

    let retval = match result {
        Ok(()) => 0,
        Err(err) => {
            error!("command failed: {:#}", err);
            eprintln!("error: {:?}", err);
            1
        }
    };
    process::exit(retval);
}

fn resolve_input(input: &InputOpts) -> Result<Resolution> {
    let graph = input.load_graph()?;
    let groups = input.load_groups()?;
    Ok(assign(&groups, &graph)?)
}

#[tracing::instrument("driver::assign", level = "info", skip_all)]
fn run_assign(assign_opts: &AssignOpts) -> Result<()> {
    let resolution = resolve_input(&assign_opts.input)?;
    let report = resolution.report();

    match &assign_opts.output {
        Some(path) => {
            let file = fs::File::create(path).with_context(|| format!("failed to create output file {:?}", path))?;
            let mut writer = BufWriter::new(file);
            report.write_json(&mut writer)?;
            writeln!(writer)?;
            writer
                .flush()
                .with_context(|| format!("failed to write output file {:?}", path))?;
        }
        None => {
            let stdout = io::stdout();
            let mut stdout = stdout.lock();
            report.write_json(&mut stdout)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

#[tracing::instrument("driver::members", level = "info", skip_all)]
fn members(members_opts: &MembersOpts) -> Result<()> {
    let resolution = resolve_input(&members_opts.input)?;
    let by_group = resolution.assignments.by_group();

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    for group in resolution.groups.iter() {
        writeln!(stdout, "{}:", group.name)?;
        for target in by_group.get(group.name.as_str()).into_iter().flatten() {
            writeln!(stdout, "  {}", target)?;
        }
    }
    Ok(())
}

#[tracing::instrument("driver::roots", level = "info", skip_all)]
fn roots(roots_opts: &RootsOpts) -> Result<()> {
    let groups = roots_opts.groups.load_groups()?;

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    for root in collect_roots(&groups) {
        writeln!(stdout, "{}", root)?;
    }
    Ok(())
}
