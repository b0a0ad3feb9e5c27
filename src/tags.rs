//! Builds the immutable and floating tag lists for a release.

use crate::{
    branch::{ChannelConfig, ResolvedBranch},
    channel::{is_minor_maintenance, DEFAULT_CHANNEL},
    config::ChannelOverride,
};

/// The two tag lists, in the order they should be created.
///
/// `git_tags` are created once per release and never move. `tags` may
/// overwrite existing tags of the same name on every release (the roll-ups
/// like `v2` and the channel tag).
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct TagSets {
    pub(crate) git_tags: Vec<String>,
    pub(crate) tags: Vec<String>,
}

/// Tags for a release decided by the engine.
///
/// Both lists always start with the version itself. Roll-up tags (the version
/// minus trailing segments) are skipped for prereleases, and the major
/// roll-up is skipped when the branch maintains a single minor line. The
/// channel lands in `tags` when it was configured by name or is the implicit
/// default, and in `git_tags` only when it would not collide with a branch of
/// the same name.
pub(crate) fn for_release(
    version: &str,
    branch: &ResolvedBranch,
    channel: Option<&str>,
    floating: bool,
) -> TagSets {
    let mut git_tags = vec![version.to_string()];
    let mut tags = vec![version.to_string()];

    if !floating {
        // No channel tag will exist, but downstream steps still need to see
        // the implicit default channel in the mutable list.
        if let Some(channel) = channel {
            if !branch.is_prerelease()
                && matches!(branch.channel, ChannelConfig::Unset)
                && channel != branch.name
            {
                tags.push(channel.to_string());
            }
        }
        return TagSets { git_tags, tags };
    }

    if !branch.is_prerelease() {
        if let Some((minor, _)) = version.rsplit_once('.') {
            git_tags.push(minor.to_string());
            tags.push(minor.to_string());
            if !is_minor_maintenance(branch.effective_range()) {
                if let Some((major, _)) = minor.rsplit_once('.') {
                    git_tags.push(major.to_string());
                    tags.push(major.to_string());
                }
            }
        }
    }

    if let Some(channel) = channel {
        let named = matches!(branch.channel, ChannelConfig::Named(_));
        let unset = matches!(branch.channel, ChannelConfig::Unset);
        if (named || unset) && channel != branch.name {
            git_tags.push(channel.to_string());
        }
        if named || (unset && channel == DEFAULT_CHANNEL) {
            tags.push(channel.to_string());
        }
    }

    TagSets { git_tags, tags }
}

/// Tags for an explicitly requested version, which skips the engine entirely.
///
/// The version is taken verbatim, so roll-ups strip every trailing
/// `.`-segment instead of assuming semver. Returns the channel alongside the
/// tags because the override decides both.
pub(crate) fn for_explicit(
    version: &str,
    current_branch: &str,
    requested: &ChannelOverride,
    floating: bool,
) -> (String, TagSets) {
    let channel = match requested {
        ChannelOverride::UseBranch => current_branch.to_string(),
        ChannelOverride::Unset => DEFAULT_CHANNEL.to_string(),
        ChannelOverride::Named(name) => name.clone(),
    };
    let mut git_tags = vec![version.to_string()];
    let mut tags = vec![version.to_string()];

    if floating {
        let mut prefix = version;
        while let Some((shorter, _)) = prefix.rsplit_once('.') {
            git_tags.push(shorter.to_string());
            tags.push(shorter.to_string());
            prefix = shorter;
        }
        if !matches!(requested, ChannelOverride::UseBranch) {
            if channel != current_branch {
                git_tags.push(channel.clone());
            }
            tags.push(channel.clone());
        }
    }

    (channel, TagSets { git_tags, tags })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{branch::PrereleaseConfig, channel::resolve};

    fn branch(
        name: &str,
        channel: ChannelConfig,
        prerelease: PrereleaseConfig,
        range: Option<&str>,
    ) -> ResolvedBranch {
        ResolvedBranch {
            name: name.to_string(),
            channel,
            prerelease,
            range: range.map(String::from),
        }
    }

    fn named(channel: &str) -> ChannelConfig {
        ChannelConfig::Named(channel.to_string())
    }

    #[rstest]
    #[case::mainline_silent(
        branch("main", ChannelConfig::Unset, PrereleaseConfig::Off, None),
        "2.3.0",
        &["2.3.0", "2.3", "2", "latest"],
        &["2.3.0", "2.3", "2", "latest"],
    )]
    #[case::mainline_channel_off(
        branch("main", ChannelConfig::Empty, PrereleaseConfig::Off, None),
        "2.3.0",
        &["2.3.0", "2.3", "2"],
        &["2.3.0", "2.3", "2"],
    )]
    #[case::mainline_channel_is_branch_name(
        branch("main", named("main"), PrereleaseConfig::Off, None),
        "2.3.0",
        &["2.3.0", "2.3", "2"],
        &["2.3.0", "2.3", "2", "main"],
    )]
    #[case::mainline_named_channel(
        branch("main", named("stable"), PrereleaseConfig::Off, None),
        "2.3.0",
        &["2.3.0", "2.3", "2", "stable"],
        &["2.3.0", "2.3", "2", "stable"],
    )]
    #[case::major_maintenance_silent(
        branch("1.x.x", ChannelConfig::Unset, PrereleaseConfig::Off, None),
        "1.6.0",
        &["1.6.0", "1.6", "1"],
        &["1.6.0", "1.6", "1"],
    )]
    #[case::major_maintenance_channel_is_branch_name(
        branch("1.x.x", named("1.x.x"), PrereleaseConfig::Off, None),
        "1.6.0",
        &["1.6.0", "1.6", "1"],
        &["1.6.0", "1.6", "1", "1.x.x"],
    )]
    #[case::major_maintenance_named_channel(
        branch("1.x.x", named("legacy"), PrereleaseConfig::Off, None),
        "1.6.0",
        &["1.6.0", "1.6", "1", "legacy"],
        &["1.6.0", "1.6", "1", "legacy"],
    )]
    #[case::minor_maintenance_skips_major_roll_up(
        branch("1.2.x", ChannelConfig::Unset, PrereleaseConfig::Off, Some("1.2.x")),
        "1.2.2",
        &["1.2.2", "1.2"],
        &["1.2.2", "1.2"],
    )]
    #[case::minor_maintenance_by_name_alone(
        branch("1.2.x", ChannelConfig::Unset, PrereleaseConfig::Off, None),
        "1.2.2",
        &["1.2.2", "1.2"],
        &["1.2.2", "1.2"],
    )]
    #[case::minor_maintenance_with_an_empty_range(
        branch("1.2.x", ChannelConfig::Unset, PrereleaseConfig::Off, Some("")),
        "1.2.2",
        &["1.2.2", "1.2"],
        &["1.2.2", "1.2"],
    )]
    #[case::minor_maintenance_channel_is_branch_name(
        branch("1.2.x", named("1.2.x"), PrereleaseConfig::Off, Some("1.2.x")),
        "1.2.2",
        &["1.2.2", "1.2"],
        &["1.2.2", "1.2", "1.2.x"],
    )]
    #[case::prerelease_silent(
        branch("beta", ChannelConfig::Unset, PrereleaseConfig::On, None),
        "3.0.0-beta.4",
        &["3.0.0-beta.4"],
        &["3.0.0-beta.4"],
    )]
    #[case::prerelease_channel_off(
        branch("beta", ChannelConfig::Empty, PrereleaseConfig::On, None),
        "3.0.0-beta.4",
        &["3.0.0-beta.4"],
        &["3.0.0-beta.4"],
    )]
    #[case::prerelease_channel_is_branch_name(
        branch("beta", named("beta"), PrereleaseConfig::On, None),
        "3.0.0-beta.4",
        &["3.0.0-beta.4"],
        &["3.0.0-beta.4", "beta"],
    )]
    #[case::prerelease_named_channel(
        branch("beta", named("next"), PrereleaseConfig::On, None),
        "3.0.0-beta.4",
        &["3.0.0-beta.4", "next"],
        &["3.0.0-beta.4", "next"],
    )]
    fn floating_tag_sets(
        #[case] branch: ResolvedBranch,
        #[case] version: &str,
        #[case] expected_git_tags: &[&str],
        #[case] expected_tags: &[&str],
    ) {
        let channel = resolve(&branch);

        let tag_sets = for_release(version, &branch, channel.as_deref(), true);

        assert_eq!(tag_sets.git_tags, expected_git_tags);
        assert_eq!(tag_sets.tags, expected_tags);
    }

    #[test]
    fn floating_off_keeps_only_the_version() {
        let branch = branch("main", named("stable"), PrereleaseConfig::Off, None);

        let tag_sets = for_release("2.3.0", &branch, Some("stable"), false);

        assert_eq!(tag_sets.git_tags, &["2.3.0"]);
        assert_eq!(tag_sets.tags, &["2.3.0"]);
    }

    #[test]
    fn floating_off_still_records_the_implicit_channel() {
        let branch = branch("main", ChannelConfig::Unset, PrereleaseConfig::Off, None);

        let tag_sets = for_release("2.3.0", &branch, Some("latest"), false);

        assert_eq!(tag_sets.git_tags, &["2.3.0"]);
        assert_eq!(tag_sets.tags, &["2.3.0", "latest"]);
    }

    #[test]
    fn floating_off_branch_named_like_the_channel_adds_nothing() {
        let branch = branch("latest", ChannelConfig::Unset, PrereleaseConfig::Off, None);

        let tag_sets = for_release("2.3.0", &branch, Some("latest"), false);

        assert_eq!(tag_sets.git_tags, &["2.3.0"]);
        assert_eq!(tag_sets.tags, &["2.3.0"]);
    }

    #[test]
    fn floating_off_prerelease_has_no_extra_tags() {
        let branch = branch("beta", ChannelConfig::Unset, PrereleaseConfig::On, None);

        let tag_sets = for_release("3.0.0-beta.4", &branch, Some("beta"), false);

        assert_eq!(tag_sets.git_tags, &["3.0.0-beta.4"]);
        assert_eq!(tag_sets.tags, &["3.0.0-beta.4"]);
    }

    #[test]
    fn dotless_version_has_no_roll_ups() {
        let branch = branch("main", ChannelConfig::Unset, PrereleaseConfig::Off, None);

        let tag_sets = for_release("1", &branch, Some("latest"), true);

        assert_eq!(tag_sets.git_tags, &["1", "latest"]);
        assert_eq!(tag_sets.tags, &["1", "latest"]);
    }

    #[test]
    fn explicit_version_without_override_lands_on_the_default_channel() {
        let (channel, tag_sets) = for_explicit("1.2.4", "main", &ChannelOverride::Unset, false);

        assert_eq!(channel, "latest");
        assert_eq!(tag_sets.git_tags, &["1.2.4"]);
        assert_eq!(tag_sets.tags, &["1.2.4"]);
    }

    #[test]
    fn explicit_version_with_floating_tags_strips_every_segment() {
        let (channel, tag_sets) = for_explicit(
            "v2.0.0",
            "main",
            &ChannelOverride::Named("main".to_string()),
            true,
        );

        assert_eq!(channel, "main");
        assert_eq!(tag_sets.git_tags, &["v2.0.0", "v2.0", "v2"]);
        assert_eq!(tag_sets.tags, &["v2.0.0", "v2.0", "v2", "main"]);
    }

    #[test]
    fn explicit_version_named_channel_floats_too() {
        let (channel, tag_sets) = for_explicit(
            "1.2.4",
            "main",
            &ChannelOverride::Named("stable".to_string()),
            true,
        );

        assert_eq!(channel, "stable");
        assert_eq!(tag_sets.git_tags, &["1.2.4", "1.2", "1", "stable"]);
        assert_eq!(tag_sets.tags, &["1.2.4", "1.2", "1", "stable"]);
    }

    #[test]
    fn explicit_version_on_the_branch_channel_skips_channel_tags() {
        let (channel, tag_sets) =
            for_explicit("1.2.4", "release-line", &ChannelOverride::UseBranch, true);

        assert_eq!(channel, "release-line");
        assert_eq!(tag_sets.git_tags, &["1.2.4", "1.2", "1"]);
        assert_eq!(tag_sets.tags, &["1.2.4", "1.2", "1"]);
    }

    #[test]
    fn explicit_default_channel_floats_when_enabled() {
        let (channel, tag_sets) = for_explicit("1.2.4", "main", &ChannelOverride::Unset, true);

        assert_eq!(channel, "latest");
        assert_eq!(tag_sets.git_tags, &["1.2.4", "1.2", "1", "latest"]);
        assert_eq!(tag_sets.tags, &["1.2.4", "1.2", "1", "latest"]);
    }
}
