//! Opaque course, library, block and aside keys
//!
//! Keys are parsed from their string form and rendered back in canonical
//! form. The string forms are:
//!
//! - `course-v1:ORG+COURSE+RUN[+branch@BRANCH]`
//! - `lib-v1:ORG+LIB` (`library-v1:` is accepted on input)
//! - `block-v1:ORG+COURSE+RUN+type@TYPE+block@ID`
//! - `lib-block-v1:ORG+LIB+type@TYPE+block@ID`
//! - `aside-usage-v1:<block key>::<aside type>` and `aside-usage-v2:...`
//!
//! Block keys also accept the positional form `...+TYPE+ID` without tags.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::KeyError;

/// Namespace of course context keys
pub const COURSE_NAMESPACE: &str = "course-v1";
/// Namespace of library context keys
pub const LIBRARY_NAMESPACE: &str = "lib-v1";
/// Long-form library namespace accepted on input
pub const LIBRARY_NAMESPACE_LONG: &str = "library-v1";
/// Namespace of course block keys
pub const BLOCK_NAMESPACE: &str = "block-v1";
/// Namespace of library block keys
pub const LIBRARY_BLOCK_NAMESPACE: &str = "lib-block-v1";
/// Namespace of first-generation aside keys
pub const ASIDE_V1_NAMESPACE: &str = "aside-usage-v1";
/// Namespace of second-generation aside keys
pub const ASIDE_V2_NAMESPACE: &str = "aside-usage-v2";

static COMPONENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w\-~.:]+$").expect("component pattern is valid"));

fn validate_component(value: &str) -> Result<(), KeyError> {
    if COMPONENT_RE.is_match(value) {
        Ok(())
    } else {
        Err(KeyError::InvalidComponent(value.to_string()))
    }
}

fn split_namespace(key: &str) -> Result<(&str, &str), KeyError> {
    key.split_once(':')
        .filter(|(_, body)| !body.is_empty())
        .ok_or_else(|| KeyError::malformed(key, "missing namespace"))
}

/// `+`-separated key body split into positional and `tag@value` tokens
struct Tokens<'a> {
    positional: Vec<&'a str>,
    tagged: Vec<(&'a str, &'a str)>,
}

impl<'a> Tokens<'a> {
    fn parse(key: &str, body: &'a str) -> Result<Self, KeyError> {
        let mut positional = Vec::new();
        let mut tagged = Vec::new();

        for token in body.split('+') {
            match token.split_once('@') {
                Some((tag, value)) => {
                    validate_component(value)?;
                    tagged.push((tag, value));
                }
                None if token.is_empty() => {
                    return Err(KeyError::malformed(key, "empty key component"));
                }
                None => {
                    validate_component(token)?;
                    positional.push(token);
                }
            }
        }

        Ok(Self { positional, tagged })
    }

    fn tag(&self, name: &str) -> Option<&'a str> {
        self.tagged
            .iter()
            .find(|(tag, _)| *tag == name)
            .map(|(_, value)| *value)
    }

    fn reject_tags_except(&self, key: &str, allowed: &[&str]) -> Result<(), KeyError> {
        match self.tagged.iter().find(|(tag, _)| !allowed.contains(tag)) {
            Some((tag, _)) => Err(KeyError::malformed(key, format!("unexpected tag '{}'", tag))),
            None => Ok(()),
        }
    }
}

// ============================================================================
// Context keys
// ============================================================================

/// A course run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourseLocator {
    pub org: String,
    pub course: String,
    pub run: String,
    pub branch: Option<String>,
}

/// A content library
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LibraryLocator {
    pub org: String,
    pub library: String,
}

/// The course or library a block belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ContextKey {
    Course(CourseLocator),
    Library(LibraryLocator),
}

impl ContextKey {
    /// Build a course context key
    pub fn course(
        org: impl Into<String>,
        course: impl Into<String>,
        run: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let locator = CourseLocator {
            org: org.into(),
            course: course.into(),
            run: run.into(),
            branch: None,
        };
        for part in [&locator.org, &locator.course, &locator.run] {
            validate_component(part)?;
        }
        Ok(ContextKey::Course(locator))
    }

    /// Build a library context key
    pub fn library(org: impl Into<String>, library: impl Into<String>) -> Result<Self, KeyError> {
        let locator = LibraryLocator {
            org: org.into(),
            library: library.into(),
        };
        validate_component(&locator.org)?;
        validate_component(&locator.library)?;
        Ok(ContextKey::Library(locator))
    }

    /// Whether this key names a content library
    pub fn is_library(&self) -> bool {
        matches!(self, ContextKey::Library(_))
    }

    /// Organization owning the course or library
    pub fn org(&self) -> &str {
        match self {
            ContextKey::Course(c) => &c.org,
            ContextKey::Library(l) => &l.org,
        }
    }

    fn parse_course_body(key: &str, tokens: &Tokens<'_>) -> Result<CourseLocator, KeyError> {
        let [org, course, run] = tokens.positional[..] else {
            return Err(KeyError::malformed(key, "expected ORG+COURSE+RUN"));
        };
        Ok(CourseLocator {
            org: org.to_string(),
            course: course.to_string(),
            run: run.to_string(),
            branch: tokens.tag("branch").map(str::to_string),
        })
    }

    fn parse_library_body(key: &str, positional: &[&str]) -> Result<LibraryLocator, KeyError> {
        let [org, library] = positional[..] else {
            return Err(KeyError::malformed(key, "expected ORG+LIB"));
        };
        Ok(LibraryLocator {
            org: org.to_string(),
            library: library.to_string(),
        })
    }

    fn write_body(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKey::Course(c) => {
                write!(f, "{}+{}+{}", c.org, c.course, c.run)?;
                if let Some(branch) = &c.branch {
                    write!(f, "+branch@{}", branch)?;
                }
                Ok(())
            }
            ContextKey::Library(l) => write!(f, "{}+{}", l.org, l.library),
        }
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKey::Course(_) => write!(f, "{}:", COURSE_NAMESPACE)?,
            ContextKey::Library(_) => write!(f, "{}:", LIBRARY_NAMESPACE)?,
        }
        self.write_body(f)
    }
}

impl FromStr for ContextKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, body) = split_namespace(s)?;
        let tokens = Tokens::parse(s, body)?;

        match namespace {
            COURSE_NAMESPACE => {
                tokens.reject_tags_except(s, &["branch"])?;
                Ok(ContextKey::Course(Self::parse_course_body(s, &tokens)?))
            }
            LIBRARY_NAMESPACE | LIBRARY_NAMESPACE_LONG => {
                tokens.reject_tags_except(s, &[])?;
                Ok(ContextKey::Library(Self::parse_library_body(
                    s,
                    &tokens.positional,
                )?))
            }
            other => Err(KeyError::UnknownNamespace(other.to_string())),
        }
    }
}

impl TryFrom<String> for ContextKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ContextKey> for String {
    fn from(key: ContextKey) -> Self {
        key.to_string()
    }
}

// ============================================================================
// Block keys
// ============================================================================

/// Address of a single block inside a course or library
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlockUsageLocator {
    context: ContextKey,
    block_type: String,
    block_id: String,
}

impl BlockUsageLocator {
    /// Create a block key inside the given context
    pub fn new(
        context: ContextKey,
        block_type: impl Into<String>,
        block_id: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let block_type = block_type.into();
        let block_id = block_id.into();
        validate_component(&block_type)?;
        validate_component(&block_id)?;
        Ok(Self {
            context,
            block_type,
            block_id,
        })
    }

    /// Key of a new block in the same course or library
    pub fn make_child(
        &self,
        block_type: impl Into<String>,
        block_id: impl Into<String>,
    ) -> Result<Self, KeyError> {
        Self::new(self.context.clone(), block_type, block_id)
    }

    /// Owning course or library
    pub fn context_key(&self) -> &ContextKey {
        &self.context
    }

    /// Block category (e.g. `html`, `vertical`)
    pub fn block_type(&self) -> &str {
        &self.block_type
    }

    /// Block identifier, unique within the context
    pub fn block_id(&self) -> &str {
        &self.block_id
    }

    /// Whether the block lives in a content library
    pub fn is_library(&self) -> bool {
        self.context.is_library()
    }

    fn parse_body(s: &str, namespace: &str, body: &str) -> Result<Self, KeyError> {
        let tokens = Tokens::parse(s, body)?;

        let (context, block_type, block_id) = match namespace {
            BLOCK_NAMESPACE => {
                tokens.reject_tags_except(s, &["branch", "type", "block"])?;
                match (tokens.tag("type"), tokens.tag("block")) {
                    (Some(block_type), Some(block_id)) => (
                        ContextKey::Course(ContextKey::parse_course_body(s, &tokens)?),
                        block_type,
                        block_id,
                    ),
                    (None, None) => {
                        let [org, course, run, block_type, block_id] = tokens.positional[..] else {
                            return Err(KeyError::malformed(
                                s,
                                "expected ORG+COURSE+RUN+type@TYPE+block@ID",
                            ));
                        };
                        let context = ContextKey::Course(CourseLocator {
                            org: org.to_string(),
                            course: course.to_string(),
                            run: run.to_string(),
                            branch: tokens.tag("branch").map(str::to_string),
                        });
                        (context, block_type, block_id)
                    }
                    _ => return Err(KeyError::malformed(s, "type@ and block@ must appear together")),
                }
            }
            LIBRARY_BLOCK_NAMESPACE => {
                tokens.reject_tags_except(s, &["type", "block"])?;
                match (tokens.tag("type"), tokens.tag("block")) {
                    (Some(block_type), Some(block_id)) => (
                        ContextKey::Library(ContextKey::parse_library_body(s, &tokens.positional)?),
                        block_type,
                        block_id,
                    ),
                    (None, None) => {
                        // Libraries have no runs; a run component is tolerated and dropped.
                        let (library, block_type, block_id) = match tokens.positional[..] {
                            [org, lib, block_type, block_id] => ([org, lib], block_type, block_id),
                            [org, lib, _run, block_type, block_id] => {
                                ([org, lib], block_type, block_id)
                            }
                            _ => {
                                return Err(KeyError::malformed(
                                    s,
                                    "expected ORG+LIB+type@TYPE+block@ID",
                                ))
                            }
                        };
                        (
                            ContextKey::Library(ContextKey::parse_library_body(s, &library)?),
                            block_type,
                            block_id,
                        )
                    }
                    _ => return Err(KeyError::malformed(s, "type@ and block@ must appear together")),
                }
            }
            other => return Err(KeyError::UnknownNamespace(other.to_string())),
        };

        Ok(Self {
            context,
            block_type: block_type.to_string(),
            block_id: block_id.to_string(),
        })
    }
}

impl fmt::Display for BlockUsageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let namespace = match self.context {
            ContextKey::Course(_) => BLOCK_NAMESPACE,
            ContextKey::Library(_) => LIBRARY_BLOCK_NAMESPACE,
        };
        write!(f, "{}:", namespace)?;
        self.context.write_body(f)?;
        write!(f, "+type@{}+block@{}", self.block_type, self.block_id)
    }
}

impl FromStr for BlockUsageLocator {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, body) = split_namespace(s)?;
        Self::parse_body(s, namespace, body)
    }
}

impl TryFrom<String> for BlockUsageLocator {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BlockUsageLocator> for String {
    fn from(key: BlockUsageLocator) -> Self {
        key.to_string()
    }
}

// ============================================================================
// Aside keys
// ============================================================================

/// Encoding generation of an aside key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AsideKeyVersion {
    /// `$` and `::` escaped
    V1,
    /// `$` and every `:` escaped
    V2,
}

impl AsideKeyVersion {
    fn namespace(self) -> &'static str {
        match self {
            AsideKeyVersion::V1 => ASIDE_V1_NAMESPACE,
            AsideKeyVersion::V2 => ASIDE_V2_NAMESPACE,
        }
    }

    fn encode(self, value: &str) -> String {
        let escaped = value.replace('$', "$$");
        match self {
            AsideKeyVersion::V1 => escaped.replace("::", "$::"),
            AsideKeyVersion::V2 => escaped.replace(':', "$:"),
        }
    }
}

/// Address of an aside attached to a block
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AsideUsageKey {
    usage_key: BlockUsageLocator,
    aside_type: String,
    version: AsideKeyVersion,
}

impl AsideUsageKey {
    /// Create an aside key using the current encoding
    pub fn new(usage_key: BlockUsageLocator, aside_type: impl Into<String>) -> Result<Self, KeyError> {
        Self::with_version(usage_key, aside_type, AsideKeyVersion::V2)
    }

    /// Create an aside key with an explicit encoding
    pub fn with_version(
        usage_key: BlockUsageLocator,
        aside_type: impl Into<String>,
        version: AsideKeyVersion,
    ) -> Result<Self, KeyError> {
        let aside_type = aside_type.into();
        validate_component(&aside_type)?;
        Ok(Self {
            usage_key,
            aside_type,
            version,
        })
    }

    /// Key of the block the aside is attached to
    pub fn usage_key(&self) -> &BlockUsageLocator {
        &self.usage_key
    }

    /// Aside type name
    pub fn aside_type(&self) -> &str {
        &self.aside_type
    }

    pub fn version(&self) -> AsideKeyVersion {
        self.version
    }

    fn parse_body(s: &str, version: AsideKeyVersion, body: &str) -> Result<Self, KeyError> {
        let (encoded_usage, encoded_type) = split_unescaped_separator(body)
            .ok_or_else(|| KeyError::malformed(s, "missing '::' separator"))?;

        let usage_key: BlockUsageLocator = unescape(encoded_usage).parse()?;
        Self::with_version(usage_key, unescape(encoded_type), version)
    }
}

/// Find the first `::` that is not part of a `$` escape
fn split_unescaped_separator(body: &str) -> Option<(&str, &str)> {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' => i += 2,
            b':' if bytes.get(i + 1) == Some(&b':') => {
                return Some((&body[..i], &body[i + 2..]));
            }
            _ => i += 1,
        }
    }
    None
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '$' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

impl fmt::Display for AsideUsageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}::{}",
            self.version.namespace(),
            self.version.encode(&self.usage_key.to_string()),
            self.version.encode(&self.aside_type)
        )
    }
}

impl FromStr for AsideUsageKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, body) = split_namespace(s)?;
        match namespace {
            ASIDE_V1_NAMESPACE => Self::parse_body(s, AsideKeyVersion::V1, body),
            ASIDE_V2_NAMESPACE => Self::parse_body(s, AsideKeyVersion::V2, body),
            other => Err(KeyError::UnknownNamespace(other.to_string())),
        }
    }
}

// ============================================================================
// Usage keys
// ============================================================================

/// Any addressable usage: a block or an aside on a block
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UsageKey {
    Block(BlockUsageLocator),
    Aside(AsideUsageKey),
}

impl UsageKey {
    /// Course or library the usage belongs to
    pub fn context_key(&self) -> &ContextKey {
        match self {
            UsageKey::Block(key) => key.context_key(),
            UsageKey::Aside(key) => key.usage_key().context_key(),
        }
    }

    /// Whether the usage names an aside
    pub fn is_aside(&self) -> bool {
        matches!(self, UsageKey::Aside(_))
    }

    /// Whether the usage lives in a content library
    pub fn is_library(&self) -> bool {
        self.context_key().is_library()
    }
}

impl fmt::Display for UsageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageKey::Block(key) => fmt::Display::fmt(key, f),
            UsageKey::Aside(key) => fmt::Display::fmt(key, f),
        }
    }
}

impl FromStr for UsageKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, body) = split_namespace(s)?;
        match namespace {
            BLOCK_NAMESPACE | LIBRARY_BLOCK_NAMESPACE => Ok(UsageKey::Block(
                BlockUsageLocator::parse_body(s, namespace, body)?,
            )),
            ASIDE_V1_NAMESPACE => Ok(UsageKey::Aside(AsideUsageKey::parse_body(
                s,
                AsideKeyVersion::V1,
                body,
            )?)),
            ASIDE_V2_NAMESPACE => Ok(UsageKey::Aside(AsideUsageKey::parse_body(
                s,
                AsideKeyVersion::V2,
                body,
            )?)),
            other => Err(KeyError::UnknownNamespace(other.to_string())),
        }
    }
}

impl From<BlockUsageLocator> for UsageKey {
    fn from(key: BlockUsageLocator) -> Self {
        UsageKey::Block(key)
    }
}

impl From<AsideUsageKey> for UsageKey {
    fn from(key: AsideUsageKey) -> Self {
        UsageKey::Aside(key)
    }
}
