//! Robots.txt policy documents
//!
//! Path matching is delegated to the robotstxt crate. Crawl-delay is not
//! exposed by its matcher, so rule groups are collected here through the same
//! parser, with the same group boundaries and agent matching.

use robotstxt::{parse_robotstxt, DefaultMatcher, RobotsParseHandler};
use std::time::Duration;

/// Per-agent section of a robots.txt file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleGroup {
    /// Lowercased product tokens heading the group (`*` for the wildcard)
    pub agents: Vec<String>,

    /// Declared Crawl-delay, if any
    pub crawl_delay: Option<Duration>,
}

impl RuleGroup {
    fn is_wildcard(&self) -> bool {
        self.agents.iter().any(|agent| agent == "*")
    }

    fn names(&self, user_agent: &str) -> bool {
        self.agents
            .iter()
            .any(|agent| agent != "*" && agent.eq_ignore_ascii_case(user_agent))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PolicyKind {
    AllowAll,
    DisallowAll,
    Document {
        content: String,
        groups: Vec<RuleGroup>,
    },
}

/// A site's resolved robots exclusion policy
///
/// Either a parsed document, or one of the terminal outcomes derived from the
/// HTTP status of the robots file.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotsPolicy {
    kind: PolicyKind,
}

impl RobotsPolicy {
    /// Interprets a robots.txt retrieval outcome
    ///
    /// | Status | Policy |
    /// |--------|--------|
    /// | 2xx, 3xx | parsed from `body` |
    /// | 4xx | full allow |
    /// | 5xx | full disallow |
    /// | other | full allow |
    ///
    /// A 4xx, including 401 and 403, means no usable robots.txt exists. A 5xx
    /// means the server cannot vouch for any policy right now.
    pub fn from_status_and_bytes(status: u16, body: &[u8]) -> Self {
        match status {
            200..=399 => Self::from_bytes(body),
            400..=499 => Self::allow_all(),
            500..=599 => Self::disallow_all(),
            _ => Self::allow_all(),
        }
    }

    /// Parses raw robots.txt bytes
    ///
    /// Invalid UTF-8 is replaced and unrecognised lines are ignored, so
    /// corrupt input degrades towards allowing everything instead of failing.
    pub fn from_bytes(body: &[u8]) -> Self {
        Self::from_content(&String::from_utf8_lossy(body))
    }

    /// Parses robots.txt text
    pub fn from_content(content: &str) -> Self {
        Self {
            kind: PolicyKind::Document {
                content: content.to_string(),
                groups: parse_groups(content),
            },
        }
    }

    /// Policy that permits every path
    pub fn allow_all() -> Self {
        Self {
            kind: PolicyKind::AllowAll,
        }
    }

    /// Policy that forbids every path
    pub fn disallow_all() -> Self {
        Self {
            kind: PolicyKind::DisallowAll,
        }
    }

    pub fn is_allow_all(&self) -> bool {
        matches!(self.kind, PolicyKind::AllowAll)
    }

    pub fn is_disallow_all(&self) -> bool {
        matches!(self.kind, PolicyKind::DisallowAll)
    }

    /// Raw robots.txt text, when the policy came from a document
    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            PolicyKind::Document { content, .. } => Some(content),
            _ => None,
        }
    }

    /// Rule groups in file order
    pub fn groups(&self) -> &[RuleGroup] {
        match &self.kind {
            PolicyKind::Document { groups, .. } => groups,
            _ => &[],
        }
    }

    /// Checks whether `path` may be fetched by `user_agent`
    ///
    /// # Arguments
    ///
    /// * `path` - The path (and optional query) to check, e.g. "/page?id=1"
    /// * `user_agent` - The agent's product token, e.g. "DataflowKitBot"
    pub fn is_allowed(&self, path: &str, user_agent: &str) -> bool {
        match &self.kind {
            PolicyKind::AllowAll => true,
            PolicyKind::DisallowAll => false,
            PolicyKind::Document { content, .. } => {
                let mut matcher = DefaultMatcher::default();
                matcher.one_agent_allowed_by_robots(content, user_agent, path)
            }
        }
    }

    /// Finds the rule group that applies to `user_agent`
    ///
    /// A group naming the agent's product token (case-insensitively) wins over
    /// the `*` group. This is the same selection [`is_allowed`](Self::is_allowed)
    /// makes, so both decisions always read from one group.
    pub fn group(&self, user_agent: &str) -> Option<&RuleGroup> {
        let groups = self.groups();
        groups
            .iter()
            .find(|group| group.names(user_agent))
            .or_else(|| groups.iter().find(|group| group.is_wildcard()))
    }

    /// Gets the crawl delay declared for `user_agent`
    ///
    /// When several groups name the agent, the first declared delay among
    /// them applies; the matcher merges their rules the same way.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        let groups = self.groups();
        if groups.iter().any(|group| group.names(user_agent)) {
            groups
                .iter()
                .filter(|group| group.names(user_agent))
                .find_map(|group| group.crawl_delay)
        } else {
            groups
                .iter()
                .filter(|group| group.is_wildcard())
                .find_map(|group| group.crawl_delay)
        }
    }
}

/// Splits robots.txt content into rule groups
///
/// Consecutive User-agent lines share one group; any other directive closes
/// the run so the next User-agent starts a new group.
fn parse_groups(content: &str) -> Vec<RuleGroup> {
    let mut collector = GroupCollector::default();
    parse_robotstxt(content, &mut collector);
    collector.groups
}

/// Receives parsed directives and groups them
#[derive(Default)]
struct GroupCollector {
    groups: Vec<RuleGroup>,
    seen_separator: bool,
}

impl GroupCollector {
    fn current(&mut self) -> Option<&mut RuleGroup> {
        self.groups.last_mut()
    }

    fn close_run(&mut self) {
        if !self.groups.is_empty() {
            self.seen_separator = true;
        }
    }
}

impl RobotsParseHandler for GroupCollector {
    fn handle_robots_start(&mut self) {
        self.groups.clear();
        self.seen_separator = false;
    }

    fn handle_robots_end(&mut self) {}

    fn handle_user_agent(&mut self, _line_num: u32, user_agent: &str) {
        if self.seen_separator || self.groups.is_empty() {
            self.groups.push(RuleGroup::default());
            self.seen_separator = false;
        }

        let agent = product_token(user_agent).to_ascii_lowercase();
        if let Some(group) = self.current() {
            if !agent.is_empty() {
                group.agents.push(agent);
            }
        }
    }

    fn handle_allow(&mut self, _line_num: u32, _value: &str) {
        self.close_run();
    }

    fn handle_disallow(&mut self, _line_num: u32, _value: &str) {
        self.close_run();
    }

    fn handle_sitemap(&mut self, _line_num: u32, _value: &str) {
        self.close_run();
    }

    fn handle_unknown_action(&mut self, _line_num: u32, action: &str, value: &str) {
        self.close_run();
        if !is_crawl_delay_key(action) {
            return;
        }
        if let (Some(group), Some(delay)) = (self.current(), parse_delay(value)) {
            group.crawl_delay.get_or_insert(delay);
        }
    }
}

/// Reduces a User-agent value to the token robots matching compares
///
/// `*` (alone or followed by whitespace) is the wildcard. Anything else is cut
/// at the first character outside `[a-zA-Z_-]`, so "FooBot/2.1" becomes "FooBot".
fn product_token(value: &str) -> &str {
    let wildcard = value
        .strip_prefix('*')
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace));
    if wildcard {
        return "*";
    }
    let end = value
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '-' || c == '_'))
        .unwrap_or(value.len());
    &value[..end]
}

fn is_crawl_delay_key(key: &str) -> bool {
    ["crawl-delay", "crawldelay", "crawl delay"]
        .iter()
        .any(|name| key.eq_ignore_ascii_case(name))
}

/// Parses a Crawl-delay value in (possibly fractional) seconds
fn parse_delay(value: &str) -> Option<Duration> {
    let seconds: f64 = value.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}
