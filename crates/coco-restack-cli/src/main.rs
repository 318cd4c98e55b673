// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

use clap::{Parser, Subcommand};
use coco_restack::{
    ConfigOverrides, Error, PipelineConfig,
    browse::{BrowseCommand, Browser},
    pipeline,
    verify::verify_output,
};
use inquire::Text;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Root of the partial PubLayNet download
    #[clap(long, global = true)]
    input: Option<PathBuf>,

    /// Transient directory holding the merged dataset between stages
    #[clap(long, global = true)]
    staging: Option<PathBuf>,

    /// Root of the re-split dataset
    #[clap(long, global = true)]
    output: Option<PathBuf>,

    /// Configuration file (TOML, YAML or JSON)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Command to run, `run` when omitted
    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Reset the staging and output trees, aggregate the shards, re-split
    /// them and remove the staging tree.
    Run {
        /// Fraction of images assigned to the train split
        #[clap(long)]
        train_ratio: Option<f64>,

        /// Shuffle seed for a reproducible split
        #[clap(long)]
        seed: Option<u64>,

        /// Leave the staging tree in place
        #[clap(long)]
        keep_staging: bool,
    },
    /// Merge the shards and stage the images found on disk.
    Aggregate,
    /// Re-split the staged dataset into train and val.
    Resplit {
        /// Fraction of images assigned to the train split
        #[clap(long)]
        train_ratio: Option<f64>,

        /// Shuffle seed for a reproducible split
        #[clap(long)]
        seed: Option<u64>,
    },
    /// Check the output tree for orphans, overlaps and stray files.
    Verify,
    /// Step through the output tree, rendering each image with its boxes.
    Browse {
        /// File the current frame is written to after every move
        #[clap(long, default_value = "preview.png")]
        preview: PathBuf,

        /// Seed for the category colours
        #[clap(long)]
        seed: Option<u64>,
    },
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides {
            input_root: self.input.clone(),
            staging_root: self.staging.clone(),
            output_root: self.output.clone(),
            ..Default::default()
        };

        match &self.cmd {
            Some(Command::Run {
                train_ratio,
                seed,
                keep_staging,
            }) => {
                overrides.train_ratio = *train_ratio;
                overrides.seed = *seed;
                overrides.keep_staging = keep_staging.then_some(true);
            }
            Some(Command::Resplit { train_ratio, seed }) => {
                overrides.train_ratio = *train_ratio;
                overrides.seed = *seed;
            }
            _ => {}
        }

        overrides
    }
}

fn handle_run(config: &PipelineConfig) -> Result<(), Error> {
    let report = pipeline::run(config)?;
    println!(
        "Consolidated {} of {} images ({} annotations in source)",
        report.summary.train_images + report.summary.val_images,
        report.source_images,
        report.source_annotations
    );
    println!();
    print!("{}", report.summary);
    Ok(())
}

fn handle_aggregate(config: &PipelineConfig) -> Result<(), Error> {
    let aggregation = pipeline::run_aggregate(config)?;
    println!(
        "Staged {} of {} images and {} of {} annotations in {}",
        aggregation.dataset.images.len(),
        aggregation.source_images,
        aggregation.dataset.annotations.len(),
        aggregation.source_annotations,
        config.layout().merged_annotations().display()
    );
    Ok(())
}

fn handle_resplit(config: &PipelineConfig) -> Result<(), Error> {
    let summary = pipeline::run_resplit(config)?;
    print!("{}", summary);
    Ok(())
}

fn handle_verify(config: &PipelineConfig) -> Result<(), Error> {
    let report = verify_output(&config.output_root)?;
    print!("{}", report);
    match report.first_problem() {
        Some(problem) => Err(Error::VerificationFailed(problem)),
        None => Ok(()),
    }
}

fn handle_browse(config: &PipelineConfig, preview: &Path, seed: Option<u64>) -> Result<(), Error> {
    let mut browser = Browser::open(&config.output_root, seed)?;

    loop {
        match browser.current() {
            Some(view) => {
                println!("{}", view.status());
                for line in view.annotation_lines() {
                    println!("  {}", line);
                }
                browser.render(&view)?.save(preview)?;
                log::debug!("Wrote {}", preview.display());
            }
            None => println!("Set: {} is empty", browser.split()),
        }

        let key = Text::new("[n]ext [p]revious [t]rain [v]al [q]uit").prompt()?;
        match key.parse::<BrowseCommand>() {
            Ok(command) => {
                if !browser.apply(command) {
                    break;
                }
            }
            Err(message) => eprintln!("{}", message),
        }
    }

    Ok(())
}

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = PipelineConfig::load(args.config.as_deref(), &args.overrides())?;
    log::debug!("{:?}", config);

    match args.cmd {
        None | Some(Command::Run { .. }) => handle_run(&config),
        Some(Command::Aggregate) => handle_aggregate(&config),
        Some(Command::Resplit { .. }) => handle_resplit(&config),
        Some(Command::Verify) => handle_verify(&config),
        Some(Command::Browse { preview, seed }) => handle_browse(&config, &preview, seed),
    }
}
