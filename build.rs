// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: configuration file
fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .default_value("svcdrop.toml")
        .help("Path to the svcdrop configuration file")
}

/// Common argument: working directory
fn working_dir_arg() -> Arg {
    Arg::new("working_dir")
        .short('w')
        .long("working-dir")
        .value_name("DIR")
        .default_value(".")
        .help("Directory holding build artifacts")
}

/// Common argument: template override directory
fn templates_arg() -> Arg {
    Arg::new("templates")
        .short('t')
        .long("templates")
        .value_name("DIR")
        .help("Directory whose templates shadow the built-in ones")
}

fn build_cli() -> Command {
    Command::new("svcdrop")
        .version(env!("CARGO_PKG_VERSION"))
        .author("svcdrop Contributors")
        .about("Build installable service packages from runner and packager definitions")
        .subcommand_required(true)
        .subcommand(
            Command::new("build")
                .about("Render every runner and write one package per packager")
                .arg(config_arg())
                .arg(working_dir_arg())
                .arg(
                    Arg::new("package_dir")
                        .short('p')
                        .long("package-dir")
                        .value_name("DIR")
                        .help("Directory receiving the finished packages"),
                )
                .arg(templates_arg()),
        )
        .subcommand(
            Command::new("plan")
                .about("Show what a build would render and install without writing anything")
                .arg(config_arg())
                .arg(working_dir_arg())
                .arg(templates_arg()),
        )
        .subcommand(
            Command::new("init")
                .about("Write a starter configuration file")
                .arg(Arg::new("path").default_value("svcdrop.toml").help("Where to write the configuration"))
                .arg(
                    Arg::new("force")
                        .short('f')
                        .long("force")
                        .action(clap::ArgAction::SetTrue)
                        .help("Overwrite an existing file"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("svcdrop.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
