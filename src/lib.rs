//! Computes everything a CI pipeline needs to publish a release: the next
//! version, the channel it lands on, the immutable and floating tag sets,
//! and an updated changelog. The version itself comes from an external
//! decision engine, this crate turns that verdict into publishable facts.

use std::{path::PathBuf, str::FromStr};

use clap::{command, value_parser, Arg, ArgMatches};
use miette::Result;

use crate::{
    config::{ChannelOverride, Config},
    escalate::Policy,
};

mod branch;
mod changelog;
mod channel;
mod config;
mod engine;
mod escalate;
mod fs;
mod git;
mod outputs;
mod release;
mod tags;

/// Parses the CLI, computes the release decision, and surfaces it through
/// the changelog, the notes file, and the step outputs.
pub fn run() -> Result<()> {
    let matches = build_cli().get_matches();
    let config = build_config(&matches)?;
    release::run(&config)?;
    Ok(())
}

fn build_cli() -> clap::Command {
    command!()
        .disable_version_flag(true)
        .arg(
            Arg::new("workspace")
                .long("workspace")
                .env("GITHUB_WORKSPACE")
                .value_parser(value_parser!(PathBuf))
                .default_value(".")
                .help("Directory of the Git checkout to release"),
        )
        .arg(
            Arg::new("branches")
                .long("branches")
                .env("RELTRACK_BRANCHES")
                .value_name("JSON")
                .help(
                    "Branch policy table: a JSON array of branch names and/or objects with \
                     name, channel, prerelease, and range fields",
                ),
        )
        .arg(
            Arg::new("plugins")
                .long("plugins")
                .env("RELTRACK_PLUGINS")
                .value_name("JSON")
                .help("Plugin list forwarded to the decision engine"),
        )
        .arg(
            Arg::new("tag_format")
                .long("tag-format")
                .env("RELTRACK_TAG_FORMAT")
                .help("Tag format forwarded to the decision engine, e.g. v${version}"),
        )
        .arg(
            Arg::new("changelog_file")
                .long("changelog-file")
                .env("RELTRACK_CHANGELOG_FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Changelog to merge the release notes into, relative to the workspace"),
        )
        .arg(
            Arg::new("changelog_title")
                .long("changelog-title")
                .env("RELTRACK_CHANGELOG_TITLE")
                .help("Title to keep at the top of the changelog"),
        )
        .arg(
            Arg::new("notes_file")
                .long("notes-file")
                .env("RELTRACK_NOTES_FILE")
                .value_parser(value_parser!(PathBuf))
                .default_value("/tmp/reltrack-notes")
                .help("Where to write the raw release notes for later pipeline steps"),
        )
        .arg(
            Arg::new("version_bump")
                .long("version-bump")
                .env("RELTRACK_VERSION_BUMP")
                .help(
                    "Force a release when no commit asks for one: default-minor or default-patch",
                ),
        )
        .arg(
            Arg::new("floating_tags")
                .long("floating-tags")
                .env("RELTRACK_FLOATING_TAGS")
                .value_parser(value_parser!(bool))
                .default_value("true")
                .help("Create roll-up and channel tags in addition to the version tag"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .env("RELTRACK_VERSION")
                .help("Release exactly this version instead of asking the decision engine"),
        )
        .arg(
            Arg::new("release_channel")
                .long("release-channel")
                .env("RELTRACK_RELEASE_CHANNEL")
                .help(
                    "Channel for an explicitly versioned release: a channel name, or the literal \
                     false to use the branch name without channel tags",
                ),
        )
        .arg(
            Arg::new("repository_url")
                .long("repository-url")
                .env("REPOSITORY_URL")
                .help("Remote repository URL forwarded to the decision engine"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .env("GITHUB_OUTPUT")
                .value_parser(value_parser!(PathBuf))
                .help("Step outputs file to append key=value lines to"),
        )
        .arg(
            Arg::new("decider")
                .long("decider")
                .env("RELTRACK_DECIDER")
                .required_unless_present("version")
                .help("Command that runs the release decision engine"),
        )
}

fn build_config(matches: &ArgMatches) -> Result<Config> {
    let version_bump = matches
        .get_one::<String>("version_bump")
        .map(|raw| Policy::from_str(raw))
        .transpose()?;
    Ok(Config {
        workspace: matches
            .get_one::<PathBuf>("workspace")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(".")),
        branches: matches.get_one::<String>("branches").cloned(),
        plugins: matches.get_one::<String>("plugins").cloned(),
        tag_format: matches.get_one::<String>("tag_format").cloned(),
        changelog_file: matches.get_one::<PathBuf>("changelog_file").cloned(),
        changelog_title: matches.get_one::<String>("changelog_title").cloned(),
        notes_file: matches
            .get_one::<PathBuf>("notes_file")
            .cloned()
            .unwrap_or_else(|| PathBuf::from("/tmp/reltrack-notes")),
        version_bump,
        floating_tags: matches
            .get_one::<bool>("floating_tags")
            .copied()
            .unwrap_or(true),
        version: matches.get_one::<String>("version").cloned(),
        release_channel: matches
            .get_one::<String>("release_channel")
            .map(|raw| ChannelOverride::parse(raw))
            .unwrap_or_default(),
        repository_url: matches.get_one::<String>("repository_url").cloned(),
        output_file: matches.get_one::<PathBuf>("output").cloned(),
        decider: matches.get_one::<String>("decider").cloned(),
    })
}
