//! cli::commands::repl
//!
//! The interactive shell.
//!
//! # Design
//!
//! [`Session`] owns the [`Workspace`] and turns one input line into a
//! [`Reply`]. The loop in [`repl`] only reads lines and prints replies, so
//! every command can be driven from tests without a terminal.
//!
//! Failures are printed and the loop continues. Mutating store commands
//! save the store document immediately.

use std::io::{self, BufRead};

use anyhow::{anyhow, bail, Context as _, Result};

use super::Context;
use crate::core::config::schema::validate_author;
use crate::core::types::{BranchName, TagName};
use crate::ui::output;
use crate::workspace::Workspace;

/// Result of one REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Text to show the user.
    Output(String),
    /// Nothing to show.
    Silent,
    /// Leave the loop.
    Exit,
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Output(text)
    }
}

struct CommandHelp {
    usage: &'static str,
    about: &'static str,
}

const fn help(usage: &'static str, about: &'static str) -> CommandHelp {
    CommandHelp { usage, about }
}

const SECTIONS: &[(&str, &[CommandHelp])] = &[
    (
        "Database Commands",
        &[
            help("insert <key> <value>", "Insert or update a key-value pair"),
            help("get <key>", "Retrieve value by key"),
            help("remove <key>", "Remove a key-value pair"),
            help("query <prefix>", "Find all keys with prefix"),
            help("queryvalue <value>", "Find keys with specific value"),
            help("querypattern <regex>", "Find keys whose value matches a regex"),
            help("btree <prefix>", "Prefix lookup in the key index"),
            help("btreevalue <prefix>", "Prefix lookup in the value index"),
            help("indexes [rebuild]", "Show (or rebuild) the B-Tree indexes"),
            help("export <filename>", "Export database to file"),
            help("import <filename> [--merge]", "Import database from file"),
            help("stats", "Show database statistics"),
        ],
    ),
    (
        "Graph Commands",
        &[
            help("addnode <node>", "Add a node to the graph"),
            help("addedge <from> <to> <weight>", "Add an edge with weight between nodes"),
            help("bfs <start>", "Perform BFS traversal"),
            help("dfs <start>", "Perform DFS traversal"),
        ],
    ),
    (
        "Version Control Commands",
        &[
            help("stage <key> <value>", "Stage a change for commit"),
            help("unstage <key>", "Remove a change from staging"),
            help("status", "Show staged changes"),
            help("commit <message>", "Commit the current state"),
            help("checkout <version>", "Checkout a specific version"),
            help("log [limit]", "Show commit history"),
            help("rollback <version>", "Roll back to a specific version"),
        ],
    ),
    (
        "Branch Commands",
        &[
            help("branch <name>", "Create a new branch"),
            help("branches", "List all branches"),
            help("switch <branch>", "Switch to a different branch"),
            help("merge <branch>", "Merge another branch into current"),
            help("history", "Show current branch history"),
        ],
    ),
    (
        "Advanced Commands",
        &[
            help("tag <name> [version]", "Create a named tag for a version"),
            help("tags", "List tags"),
            help("checkouttag <name>", "Checkout a version by tag"),
            help("search <term>", "Search commits for term"),
            help("conflicts", "List merge conflicts"),
            help("resolve <key> <value>", "Resolve a merge conflict"),
            help("author [name]", "Show or set author name"),
        ],
    ),
    (
        "Other Commands",
        &[
            help("help", "Show this menu"),
            help("exit", "Exit the application"),
        ],
    ),
];

/// The full command menu.
pub fn menu() -> String {
    let mut out = String::from("====== Versioned Database System ======");
    for (title, commands) in SECTIONS {
        out.push_str(&format!("\n{}:", title));
        for command in *commands {
            out.push_str(&format!("\n  {:<30} - {}", command.usage, command.about));
        }
    }
    out.push_str("\n=======================================");
    out
}

fn usage(name: &str) -> anyhow::Error {
    let usage = SECTIONS
        .iter()
        .flat_map(|(_, commands)| commands.iter())
        .find(|c| c.usage.split_whitespace().next() == Some(name))
        .map(|c| c.usage)
        .unwrap_or(name);
    anyhow!("Usage: {}", usage)
}

/// Split a command line on whitespace, keeping double-quoted sections
/// together. Quote characters themselves are dropped.
///
/// # Example
///
/// ```
/// use verdant::cli::commands::repl::parse_command_line;
///
/// let args = parse_command_line(r#"insert greeting "hello world""#);
/// assert_eq!(args, vec!["insert", "greeting", "hello world"]);
/// ```
pub fn parse_command_line(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }

    args
}

fn parse_version(arg: &str) -> Result<usize> {
    arg.parse()
        .map_err(|_| anyhow!("Invalid version number: {}", arg))
}

/// An interactive session over one workspace.
#[derive(Debug)]
pub struct Session {
    workspace: Workspace,
}

impl Session {
    /// Start a session.
    pub fn new(workspace: Workspace) -> Self {
        Self { workspace }
    }

    /// The session's workspace.
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Execute one input line.
    pub fn execute(&mut self, line: &str) -> Result<Reply> {
        let args = parse_command_line(line);
        let Some(first) = args.first() else {
            return Ok(Reply::Silent);
        };
        let command = first.to_lowercase();
        let rest = &args[1..];

        let arg = |i: usize| rest.get(i).map(String::as_str).ok_or_else(|| usage(&command));
        let tail = |from: usize| -> Result<String> {
            if rest.len() <= from {
                return Err(usage(&command));
            }
            Ok(rest[from..].join(" "))
        };

        match command.as_str() {
            // Database
            "insert" => self.insert(arg(0)?, &tail(1)?),
            "get" => Ok(self.get(arg(0)?)),
            "remove" => self.remove(arg(0)?),
            "query" => Ok(self.query(arg(0)?)),
            "queryvalue" => Ok(self.query_value(arg(0)?)),
            "querypattern" => self.query_pattern(arg(0)?),
            "btree" => Ok(self.btree(arg(0)?, false)),
            "btreevalue" => Ok(self.btree(arg(0)?, true)),
            "indexes" => Ok(self.indexes(rest.first().map(String::as_str))),
            "export" => self.export(arg(0)?),
            "import" => self.import(arg(0)?, rest.get(1).is_some_and(|a| a == "--merge")),
            "stats" => Ok(self.stats()),

            // Graph
            "addnode" => Ok(self.add_node(arg(0)?)),
            "addedge" => self.add_edge(arg(0)?, arg(1)?, arg(2)?),
            "bfs" => Ok(output::format_inline(&self.workspace.graph().bfs(arg(0)?)).into()),
            "dfs" => Ok(output::format_inline(&self.workspace.graph().dfs(arg(0)?)).into()),

            // Version control
            "stage" => Ok(self.stage(arg(0)?, &tail(1)?)),
            "unstage" => Ok(self.unstage(arg(0)?)),
            "status" => Ok(self.status()),
            "commit" => self.commit(&tail(0)?),
            "checkout" => self.checkout(arg(0)?, false),
            "rollback" => self.checkout(arg(0)?, true),
            "log" => Ok(self.log(rest.first().map(String::as_str))),

            // Branches
            "branch" => self.create_branch(arg(0)?),
            "branches" => Ok(self.branches()),
            "switch" => self.switch_branch(arg(0)?),
            "merge" => self.merge(arg(0)?),
            "history" => Ok(self.history()),

            // Advanced
            "tag" => self.tag(arg(0)?, rest.get(1).map(String::as_str)),
            "tags" => self.tags(),
            "checkouttag" => self.checkout_tag(arg(0)?),
            "search" => Ok(self.search(&tail(0)?)),
            "conflicts" => Ok(self.conflicts()),
            "resolve" => self.resolve(arg(0)?, &tail(1)?),
            "author" => self.author(rest.first().map(String::as_str)),

            "help" => Ok(menu().into()),
            "exit" | "quit" => Ok(Reply::Exit),
            _ => bail!(
                "Unknown or incomplete command: {}\nType 'help' for a list of commands.",
                line.trim()
            ),
        }
    }

    // =========================================================================
    // Database
    // =========================================================================

    fn save(&self) -> Result<()> {
        self.workspace
            .store()
            .save()
            .context("Failed to save database")
    }

    fn insert(&mut self, key: &str, value: &str) -> Result<Reply> {
        self.workspace.store().insert(key, value);
        self.save()?;
        Ok(format!("Inserted: {} = {}", key, value).into())
    }

    fn get(&self, key: &str) -> Reply {
        match self.workspace.store().get(key) {
            Some(value) => format!("{} = {}", key, value).into(),
            None => format!("Key not found: {}", key).into(),
        }
    }

    fn remove(&mut self, key: &str) -> Result<Reply> {
        if !self.workspace.store().remove(key) {
            return Ok(format!("Key not found: {}", key).into());
        }
        self.save()?;
        Ok(format!("Removed key: {}", key).into())
    }

    fn with_values(&self, keys: &[String]) -> Vec<String> {
        let store = self.workspace.store();
        keys.iter()
            .map(|k| format!("{} = {}", k, store.get(k).unwrap_or_default()))
            .collect()
    }

    fn query(&self, prefix: &str) -> Reply {
        let keys = self.workspace.store().query_by_prefix(prefix);
        found(
            format!("Found {} keys with prefix '{}':", keys.len(), prefix),
            &self.with_values(&keys),
        )
    }

    fn query_value(&self, value: &str) -> Reply {
        let keys = self.workspace.store().query_by_value(value);
        found(format!("Found {} keys with value '{}':", keys.len(), value), &keys)
    }

    fn query_pattern(&self, pattern: &str) -> Result<Reply> {
        let keys = self.workspace.store().query_by_value_pattern(pattern)?;
        Ok(found(
            format!("Found {} keys matching '{}':", keys.len(), pattern),
            &self.with_values(&keys),
        ))
    }

    fn btree(&self, prefix: &str, values: bool) -> Reply {
        let store = self.workspace.store();
        let (label, hits) = if values {
            ("value", store.query_by_value_btree(prefix))
        } else {
            ("key", store.query_by_prefix_btree(prefix))
        };
        found(
            format!("Found {} {} index entries with prefix '{}':", hits.len(), label, prefix),
            &hits,
        )
    }

    fn indexes(&self, action: Option<&str>) -> Reply {
        let store = self.workspace.store();
        let rebuilt = action == Some("rebuild");
        if rebuilt {
            store.rebuild_indexes();
        }

        let mut lines = Vec::new();
        if rebuilt {
            lines.push("Indexes rebuilt.".to_string());
        }
        lines.push(format!(
            "Key B-Tree Index: {}",
            output::format_inline(&store.key_index_dump())
        ));
        lines.push(format!(
            "Value B-Tree Index: {}",
            output::format_inline(&store.value_index_dump())
        ));
        let named = store.index_names();
        if !named.is_empty() {
            lines.push(format!("Named indexes: {}", named.join(", ")));
        }
        lines.join("\n").into()
    }

    fn export(&self, file: &str) -> Result<Reply> {
        self.workspace
            .store()
            .export_to(file.as_ref())
            .context("Failed to export database")?;
        Ok(format!("Database exported to {}", file).into())
    }

    fn import(&mut self, file: &str, merge: bool) -> Result<Reply> {
        self.workspace
            .store()
            .import_from(file.as_ref(), merge)
            .context("Failed to import database")?;
        self.save()?;
        let mode = if merge { "merged" } else { "replaced" };
        Ok(format!("Database imported from {} ({})", file, mode).into())
    }

    fn stats(&self) -> Reply {
        let store = self.workspace.store();
        let mut out = format!("Database statistics:\n  Total entries: {}", store.size());

        let mut distribution: Vec<_> = store.value_distribution().into_iter().collect();
        if !distribution.is_empty() {
            distribution.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            out.push_str("\n  Value distribution (top 5):");
            for (value, count) in distribution.iter().take(5) {
                out.push_str(&format!("\n    {}: {}", value, count));
            }
        }
        out.into()
    }

    // =========================================================================
    // Graph
    // =========================================================================

    fn add_node(&mut self, node: &str) -> Reply {
        self.workspace.graph_mut().insert_node(node);
        format!("Node {} added.", node).into()
    }

    fn add_edge(&mut self, from: &str, to: &str, weight: &str) -> Result<Reply> {
        let weight: i64 = weight
            .parse()
            .map_err(|_| anyhow!("Invalid weight: {}", weight))?;
        self.workspace.graph_mut().insert_edge(from, to, weight);
        Ok(format!("Edge added between {} and {}.", from, to).into())
    }

    // =========================================================================
    // Version control
    // =========================================================================

    fn stage(&mut self, key: &str, value: &str) -> Reply {
        self.workspace.vcs_mut().stage_change(key, value);
        format!("Staged: {} = {}", key, value).into()
    }

    fn unstage(&mut self, key: &str) -> Reply {
        if self.workspace.vcs_mut().unstage_change(key) {
            format!("Unstaged: {}", key).into()
        } else {
            format!("Not staged: {}", key).into()
        }
    }

    fn status(&self) -> Reply {
        let vcs = self.workspace.vcs();
        let staged = vcs.staged_changes();
        let mut out = format!("On branch {}", vcs.current_branch());
        if staged.is_empty() {
            out.push_str("\nNo staged changes.");
        } else {
            out.push('\n');
            out.push_str(&output::format_list(staged, "Staged: "));
        }
        if vcs.state().is_conflicted() {
            out.push_str(&format!(
                "\n{} unresolved conflict(s). Use 'conflicts' to list them.",
                vcs.conflicts().len()
            ));
        }
        out.into()
    }

    fn commit(&mut self, message: &str) -> Result<Reply> {
        let id = self.workspace.commit(message)?;
        Ok(format!(
            "Committed version {} on branch {}",
            id,
            self.workspace.vcs().current_branch()
        )
        .into())
    }

    fn checkout(&mut self, version: &str, rollback: bool) -> Result<Reply> {
        let version = parse_version(version)?;
        if rollback {
            self.workspace
                .rollback(version)
                .with_context(|| format!("Failed to rollback to version {}", version))?;
            Ok(format!("Rolled back to version {}", version).into())
        } else {
            self.workspace
                .checkout(version)
                .with_context(|| format!("Failed to checkout version {}", version))?;
            Ok(format!("Checked out version {}", version).into())
        }
    }

    fn log(&self, limit: Option<&str>) -> Reply {
        // Unparseable limits show everything.
        let limit = limit.and_then(|l| l.parse().ok());
        self.workspace.vcs().log(limit).into()
    }

    // =========================================================================
    // Branches
    // =========================================================================

    fn create_branch(&mut self, name: &str) -> Result<Reply> {
        let branch = BranchName::new(name)?;
        self.workspace
            .vcs_mut()
            .create_branch(branch)
            .with_context(|| format!("Failed to create branch {}", name))?;
        Ok(format!("Created branch {}", name).into())
    }

    fn branches(&self) -> Reply {
        let vcs = self.workspace.vcs();
        let lines: Vec<String> = vcs
            .list_branches()
            .into_iter()
            .map(|b| {
                let marker = if &b == vcs.current_branch() { "*" } else { " " };
                format!("{} {}", marker, b)
            })
            .collect();
        format!("Branches:\n{}", output::format_list(&lines, "  ")).into()
    }

    fn switch_branch(&mut self, name: &str) -> Result<Reply> {
        let branch = BranchName::new(name)?;
        self.workspace
            .vcs_mut()
            .switch_branch(branch)
            .with_context(|| format!("Failed to switch to branch {}", name))?;
        Ok(format!("Switched to branch {}", name).into())
    }

    fn merge(&mut self, name: &str) -> Result<Reply> {
        let branch = BranchName::new(name)?;
        let outcome = self
            .workspace
            .vcs_mut()
            .merge(&branch)
            .with_context(|| format!("Failed to merge branch {}", name))?;
        self.save()?;

        if outcome.is_clean() {
            Ok("Merge completed successfully with no conflicts."
                .to_string()
                .into())
        } else {
            Ok(format!(
                "Merge completed with conflicts on: {}\nUse 'conflicts' command to list them.",
                outcome.conflicts.join(", ")
            )
            .into())
        }
    }

    fn history(&self) -> Reply {
        let vcs = self.workspace.vcs();
        let entries = vcs.branch_history();
        if entries.is_empty() {
            return format!("No commits on branch {}.", vcs.current_branch()).into();
        }
        format!(
            "===== History of {} =====\n{}",
            vcs.current_branch(),
            output::format_list(&entries, "")
        )
        .into()
    }

    // =========================================================================
    // Advanced
    // =========================================================================

    fn tag(&mut self, name: &str, version: Option<&str>) -> Result<Reply> {
        let tag = TagName::new(name)?;
        let version = version.map(parse_version).transpose()?;
        let id = self
            .workspace
            .vcs()
            .tag(&tag, version)
            .with_context(|| format!("Failed to create tag {}", name))?;
        Ok(format!("Tagged version {} as {}", id, tag).into())
    }

    fn tags(&self) -> Result<Reply> {
        let tags = self.workspace.vcs().list_tags()?;
        if tags.is_empty() {
            return Ok("No tags.".to_string().into());
        }
        let lines: Vec<String> = tags
            .iter()
            .map(|(name, id)| format!("{} -> version {}", name, id))
            .collect();
        Ok(format!("Tags:\n{}", output::format_list(&lines, "  ")).into())
    }

    fn checkout_tag(&mut self, name: &str) -> Result<Reply> {
        let tag = TagName::new(name)?;
        let id = self
            .workspace
            .checkout_tag(&tag)
            .with_context(|| format!("Failed to checkout tag {}", name))?;
        Ok(format!("Checked out tag {} (version {})", tag, id).into())
    }

    fn search(&self, term: &str) -> Reply {
        let ids = self.workspace.vcs().search_commits(term);
        let lines: Vec<String> = ids.iter().map(|id| format!("Version {}", id)).collect();
        found(
            format!("Found {} commits matching '{}':", ids.len(), term),
            &lines,
        )
    }

    fn conflicts(&self) -> Reply {
        let conflicts = self.workspace.vcs().conflicts();
        if conflicts.is_empty() {
            return "No conflicts detected.".to_string().into();
        }
        let lines: Vec<String> = conflicts
            .iter()
            .map(|(key, value)| format!("Key: {} | Conflicting Value: {}", key, value))
            .collect();
        format!("Conflicts detected:\n{}", output::format_list(&lines, "  ")).into()
    }

    fn resolve(&mut self, key: &str, value: &str) -> Result<Reply> {
        if self.workspace.vcs_mut().resolve_conflict(key, value)? {
            Ok(format!("Conflict resolved for key: {}", key).into())
        } else {
            Ok(format!("No conflict found for key: {}", key).into())
        }
    }

    fn author(&mut self, name: Option<&str>) -> Result<Reply> {
        let vcs = self.workspace.vcs_mut();
        match name {
            Some(name) => {
                validate_author(name)?;
                vcs.set_author(name);
                Ok(format!("Author set to {}", name).into())
            }
            None => Ok(format!("Author: {}", vcs.author()).into()),
        }
    }
}

fn found<T: std::fmt::Display>(header: String, items: &[T]) -> Reply {
    if items.is_empty() {
        return header.into();
    }
    format!("{}\n{}", header, output::format_list(items, "  ")).into()
}

/// Run the REPL command.
pub fn repl(ctx: &Context) -> Result<()> {
    let workspace = Workspace::open(&ctx.config).context("Failed to open workspace")?;
    let store = workspace.store();
    output::print(
        format!(
            "Store {} ({} entries), {} commits, author: {}",
            store.file_path().display(),
            store.size(),
            workspace.vcs().commit_count(),
            workspace.vcs().author()
        ),
        ctx.verbosity,
    );
    output::print(menu(), ctx.verbosity);

    let mut session = Session::new(workspace);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        output::prompt(ctx.verbosity);
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("Failed to read input")?;

        match session.execute(&line) {
            Ok(Reply::Output(text)) => output::print(text, ctx.verbosity),
            Ok(Reply::Silent) => {}
            Ok(Reply::Exit) => break,
            Err(e) => output::error(format!("{:#}", e)),
        }
    }

    session
        .workspace()
        .store()
        .save()
        .context("Failed to save database")?;
    output::print("Exiting. Database saved.", ctx.verbosity);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use tempfile::TempDir;

    fn session(temp: &TempDir) -> Session {
        let mut config = Config::default();
        config.set_data_dir(temp.path().join("data"));
        Session::new(Workspace::open(&config).unwrap())
    }

    fn run(session: &mut Session, line: &str) -> String {
        match session.execute(line).unwrap() {
            Reply::Output(text) => text,
            other => panic!("expected output for {:?}, got {:?}", line, other),
        }
    }

    #[test]
    fn parse_plain_and_quoted() {
        assert_eq!(parse_command_line("get  user:1 "), vec!["get", "user:1"]);
        assert_eq!(
            parse_command_line(r#"insert k "a  b" c"#),
            vec!["insert", "k", "a  b", "c"]
        );
        assert_eq!(parse_command_line(r#"x"y z"w"#), vec!["xy zw"]);
        assert!(parse_command_line("   ").is_empty());
    }

    #[test]
    fn blank_line_is_silent() {
        let temp = TempDir::new().unwrap();
        let mut s = session(&temp);
        assert_eq!(s.execute("").unwrap(), Reply::Silent);
        assert_eq!(s.execute("EXIT").unwrap(), Reply::Exit);
    }

    #[test]
    fn insert_joins_value_and_saves() {
        let temp = TempDir::new().unwrap();
        let mut s = session(&temp);
        assert_eq!(run(&mut s, "insert greeting hello big world"), "Inserted: greeting = hello big world");
        assert_eq!(run(&mut s, "get greeting"), "greeting = hello big world");
        assert!(temp.path().join("data/mydb.json").exists());

        assert_eq!(run(&mut s, "remove greeting"), "Removed key: greeting");
        assert_eq!(run(&mut s, "get greeting"), "Key not found: greeting");
    }

    #[test]
    fn missing_arguments_show_usage() {
        let temp = TempDir::new().unwrap();
        let mut s = session(&temp);
        let err = s.execute("insert onlykey").unwrap_err();
        assert_eq!(err.to_string(), "Usage: insert <key> <value>");
        assert!(s.execute("frobnicate").unwrap_err().to_string().contains("Unknown"));
    }

    #[test]
    fn queries() {
        let temp = TempDir::new().unwrap();
        let mut s = session(&temp);
        run(&mut s, "insert user:1 alice");
        run(&mut s, "insert user:2 bob");

        let out = run(&mut s, "query user:");
        assert!(out.starts_with("Found 2 keys with prefix 'user:':"));
        assert!(out.contains("user:1 = alice"));

        assert!(run(&mut s, "queryvalue bob").contains("user:2"));
        assert!(run(&mut s, "querypattern ^a").contains("user:1 = alice"));
        assert!(s.execute("querypattern (").is_err());
        assert!(run(&mut s, "btree user").starts_with("Found 2 key index entries"));
        assert!(run(&mut s, "indexes").contains("Key B-Tree Index: user:1 user:2"));
    }

    #[test]
    fn stats_sorted_by_count() {
        let temp = TempDir::new().unwrap();
        let mut s = session(&temp);
        run(&mut s, "insert a x");
        run(&mut s, "insert b y");
        run(&mut s, "insert c y");
        let out = run(&mut s, "stats");
        assert!(out.contains("Total entries: 3"));
        let y = out.find("y: 2").unwrap();
        let x = out.find("x: 1").unwrap();
        assert!(y < x);
    }

    #[test]
    fn graph_commands() {
        let temp = TempDir::new().unwrap();
        let mut s = session(&temp);
        assert_eq!(run(&mut s, "addedge a b 3"), "Edge added between a and b.");
        run(&mut s, "addedge a c 1");
        assert_eq!(run(&mut s, "bfs a"), "a b c");
        assert_eq!(run(&mut s, "dfs a"), "a c b");
        assert!(s.execute("addedge a b heavy").is_err());
    }

    #[test]
    fn version_control_flow() {
        let temp = TempDir::new().unwrap();
        let mut s = session(&temp);

        run(&mut s, "stage user:1 alice");
        assert!(run(&mut s, "status").contains("Staged: user:1"));
        assert_eq!(run(&mut s, "commit initial users"), "Committed version 0 on branch main");

        run(&mut s, "branch feature");
        run(&mut s, "switch feature");
        run(&mut s, "insert user:1 bob");
        run(&mut s, "commit bob");
        assert!(run(&mut s, "branches").contains("* feature"));
        assert!(run(&mut s, "history").contains("Message: bob"));

        run(&mut s, "switch main");
        assert_eq!(run(&mut s, "checkout 0"), "Checked out version 0");
        let merged = run(&mut s, "merge feature");
        assert!(merged.contains("conflicts on: user:1"));
        assert!(run(&mut s, "conflicts").contains("Key: user:1 | Conflicting Value: bob"));
        assert!(run(&mut s, "status").contains("1 unresolved conflict(s)"));

        assert_eq!(run(&mut s, "resolve user:1 carol"), "Conflict resolved for key: user:1");
        assert_eq!(run(&mut s, "get user:1"), "user:1 = carol");
        assert_eq!(run(&mut s, "conflicts"), "No conflicts detected.");
    }

    #[test]
    fn checkout_errors() {
        let temp = TempDir::new().unwrap();
        let mut s = session(&temp);
        assert!(s.execute("checkout abc").unwrap_err().to_string().contains("Invalid version"));
        assert!(s.execute("rollback 3").is_err());
        assert!(s.execute("switch nowhere").is_err());
    }

    #[test]
    fn tags_and_search() {
        let temp = TempDir::new().unwrap();
        let mut s = session(&temp);
        run(&mut s, "insert k v1");
        run(&mut s, "commit first release");
        run(&mut s, "insert k v2");
        run(&mut s, "commit second");

        assert_eq!(run(&mut s, "tag v1 0"), "Tagged version 0 as v1");
        assert!(run(&mut s, "tags").contains("v1 -> version 0"));
        assert_eq!(run(&mut s, "checkouttag v1"), "Checked out tag v1 (version 0)");
        assert_eq!(run(&mut s, "get k"), "k = v1");

        let found = run(&mut s, "search release");
        assert!(found.starts_with("Found 1 commits matching 'release':"));
        assert!(found.contains("Version 0"));
    }

    #[test]
    fn author_show_and_set() {
        let temp = TempDir::new().unwrap();
        let mut s = session(&temp);
        assert_eq!(run(&mut s, "author"), "Author: user");
        assert_eq!(run(&mut s, "author alice"), "Author set to alice");
        run(&mut s, "commit by alice");
        assert!(run(&mut s, "log").contains("Author: alice"));
    }

    #[test]
    fn export_import() {
        let temp = TempDir::new().unwrap();
        let mut s = session(&temp);
        let file = temp.path().join("dump.json");
        let file = file.to_str().unwrap();

        run(&mut s, "insert a 1");
        run(&mut s, &format!("export {}", file));
        run(&mut s, "insert b 2");
        assert!(run(&mut s, &format!("import {}", file)).ends_with("(replaced)"));
        assert_eq!(run(&mut s, "get b"), "Key not found: b");
        run(&mut s, "insert b 2");
        assert!(run(&mut s, &format!("import {} --merge", file)).ends_with("(merged)"));
        assert_eq!(run(&mut s, "get b"), "b = 2");
    }

    #[test]
    fn menu_lists_every_section() {
        let text = menu();
        for (title, _) in SECTIONS {
            assert!(text.contains(title));
        }
        assert!(text.contains("checkouttag <name>"));
    }
}
