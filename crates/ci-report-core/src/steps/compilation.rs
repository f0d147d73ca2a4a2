//! Build the checkout with make and/or cmake.

use crate::error::ReportError;
use crate::runner::{CommandRunner, CommandSpec};
use crate::stage::{elapsed_line, StepKind, StepResult};
use crate::Result;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const BOTH_BUILD_SYSTEMS_BANNER: &str = r"

/!\        WARNING         /!\
 ! Found CMakeLists.txt as  !
 ! well as Makefile !!      !
 ! This is an unusual       !
 ! behaviour.               !
 ! Compiled with Make,      !
 ! compiling with CMake...  !
/!\                        /!\

";

/// Accumulates logs and the summed status of a sequence of commands.
struct BuildLog {
    logs: String,
    failures: u32,
}

impl BuildLog {
    async fn run(&mut self, runner: &dyn CommandRunner, spec: CommandSpec) {
        self.logs.push_str(&format!("~$ {}\n", spec));
        let out = runner.run(&spec).await;
        self.logs.push_str(&out.output);
        self.failures += out.status();
    }
}

/// Run `make` + `make fclean` when a Makefile exists, then an out-of-tree
/// cmake configure + build when a CMakeLists.txt exists.
///
/// Succeeds iff every invoked command exited 0; with neither file present
/// the step passes with only the timing line.
pub async fn run_compilation(runner: &dyn CommandRunner, workdir: &Path) -> Result<StepResult> {
    let mut log = BuildLog {
        logs: String::new(),
        failures: 0,
    };
    let mut elapsed = Duration::ZERO;
    let has_makefile = workdir.join("Makefile").is_file();
    let has_cmake = workdir.join("CMakeLists.txt").is_file();

    if has_makefile {
        info!(step = "compilation", "Building with make");
        let start = Instant::now();
        log.run(runner, CommandSpec::new("make").current_dir(workdir)).await;
        log.run(runner, CommandSpec::new("make").arg("fclean").current_dir(workdir)).await;
        elapsed += start.elapsed();
    }

    if has_cmake {
        if has_makefile {
            warn!(step = "compilation", "Both Makefile and CMakeLists.txt found");
            log.logs.push_str(BOTH_BUILD_SYSTEMS_BANNER);
        }
        info!(step = "compilation", "Building with cmake");
        let start = Instant::now();
        let source_dir = workdir
            .canonicalize()
            .map_err(|e| ReportError::at_path(workdir, e))?;
        let build_dir = tempfile::tempdir()?;
        let build_path = build_dir.path();

        log.logs.push_str(&format!("~$ mkdir {}\n", build_path.display()));
        log.logs.push_str(&format!("~$ cd {}\n", build_path.display()));
        log.run(
            runner,
            CommandSpec::new("cmake")
                .arg(source_dir.display().to_string())
                .current_dir(build_path),
        )
        .await;
        log.run(
            runner,
            CommandSpec::new("cmake")
                .args(["--build", "."])
                .current_dir(build_path),
        )
        .await;
        elapsed += start.elapsed();
    }

    log.logs.push_str(&elapsed_line("Compilation", elapsed));
    Ok(
        StepResult::from_success(StepKind::Compilation, log.failures == 0, log.logs)
            .with_elapsed(elapsed),
    )
}
