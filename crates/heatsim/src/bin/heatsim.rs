use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use heatsim::cli::{init_tracing, Backend, Cli};
use heatsim::engine::run_job;
use heatsim::image_io::{load_png, save_png};
use heatsim::types::Field;
use tracing::{error, info};

fn finish(cli: &Cli, output: &Field) -> Result<(), Box<dyn Error>> {
    save_png(output, &cli.output)?;
    info!(
        output = %cli.output.display(),
        iterations = cli.iterations,
        "simulation written"
    );
    Ok(())
}

fn run_threads(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if cli.verbose {
        print!("{}", cli.dump_opts());
    }
    let input = load_png(&cli.input)?;
    let output = run_job(&cli.to_config(), input, cli.workers())?;
    finish(cli, &output)
}

#[cfg(feature = "mpi")]
fn run_mpi(cli: &Cli) -> Result<(), Box<dyn Error>> {
    use heatsim::comm::{Communicator, MpiComm};
    use heatsim::engine::run_rank;

    if cli.workers.is_some() {
        return Err("--workers applies to the threads backend; MPI jobs take their size from the launcher".into());
    }
    let mut comm = MpiComm::initialize().ok_or("MPI is already initialized")?;
    let config = cli.to_config();
    config.validate(comm.size())?;

    let global = if comm.rank().is_coordinator() {
        if cli.verbose {
            print!("{}", cli.dump_opts());
        }
        match load_png(&cli.input) {
            Ok(field) => Some(field),
            Err(e) => {
                comm.abort(&e.to_string());
                return Err(e.into());
            }
        }
    } else {
        None
    };

    if let Some(output) = run_rank(&mut comm, &config, global)? {
        finish(cli, &output)?;
    }
    Ok(())
}

#[cfg(not(feature = "mpi"))]
fn run_mpi(_: &Cli) -> Result<(), Box<dyn Error>> {
    Err("this heatsim was built without MPI support; rebuild with `--features mpi` or pass `--backend threads`".into())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let outcome = match cli.backend {
        Backend::Threads => run_threads(&cli),
        Backend::Mpi => run_mpi(&cli),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("heatsim: {e}");
            ExitCode::FAILURE
        }
    }
}
