//! status command - Show the state of every working copy

use anyhow::{bail, Result};

use super::Workspace;
use crate::engine::scan::{self, RepoStatus, RepositoryState};
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};

/// Show branch, nearest tag and HEAD of each repository.
///
/// With no names, every library and then the target is shown.
pub fn status(ctx: &Context, libraries: &[String]) -> Result<()> {
    let ws = Workspace::open(ctx)?;
    let graph = ws.graph()?;
    let opener = ws.opener();

    let statuses = if libraries.is_empty() {
        scan::inspect(&graph, &opener)
    } else {
        let (statuses, unknown) = scan::inspect_selected(&graph, &opener, libraries);
        for name in &unknown {
            output::warn(
                format!("'{}' is not a library of '{}'", name, graph.target().name),
                ws.verbosity,
            );
        }
        statuses
    };

    for status in &statuses {
        print_status(status, ws.verbosity);
    }

    if libraries.is_empty() {
        let target = &graph.target().name;
        match ws.store.locked_descriptor(target)? {
            Some(locked) => match &locked.snapshot_version {
                Some(version) => {
                    output::print(format!("Locked snapshot: {}", version), ws.verbosity)
                }
                None => output::print("Locked snapshot: (unversioned)", ws.verbosity),
            },
            None => output::print("Locked snapshot: none", ws.verbosity),
        }
    }

    let failed: Vec<_> = statuses
        .iter()
        .filter(|s| s.state.is_err())
        .map(|s| s.name.as_str())
        .collect();
    if !failed.is_empty() {
        bail!("could not inspect: {}", failed.join(", "));
    }
    Ok(())
}

fn print_status(status: &RepoStatus, verbosity: Verbosity) {
    output::result(format!("*** {}", status.path.display()));
    match &status.state {
        Ok(state) => {
            output::result(describe(state));
            if state.dirty {
                output::print("  uncommitted changes", verbosity);
            }
            if state.ahead {
                output::print("  unpushed commits", verbosity);
            }
        }
        Err(e) => output::error(format!("{}: {}", status.name, e)),
    }
}

fn describe(state: &RepositoryState) -> String {
    let branch = match &state.branch {
        Some(branch) => branch.to_string(),
        None => "(detached)".to_string(),
    };
    let tag = state.nearest_tag.as_deref().unwrap_or("~none~");
    format!(
        "Branch: {}, Nearest Tag: {} ({})",
        branch,
        tag,
        state.head.short(7)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{BranchName, Oid};

    fn state(branch: Option<&str>, tag: Option<&str>) -> RepositoryState {
        RepositoryState {
            branch: branch.map(|b| BranchName::new(b).unwrap()),
            dirty: false,
            ahead: false,
            head: Oid::new("0123456789abcdef0123456789abcdef01234567").unwrap(),
            nearest_tag: tag.map(String::from),
        }
    }

    #[test]
    fn describes_branch_and_tag() {
        assert_eq!(
            describe(&state(Some("main"), Some("v1.2.3"))),
            "Branch: main, Nearest Tag: v1.2.3 (0123456)"
        );
    }

    #[test]
    fn describes_missing_tag_and_detached_head() {
        assert_eq!(
            describe(&state(None, None)),
            "Branch: (detached), Nearest Tag: ~none~ (0123456)"
        );
    }
}
