use std::fmt;

use serde::Serialize;

use crate::error::ModelError;

pub const PATH_SEPARATOR: char = ':';

/// Hierarchical project identity: `:` for the root, `:app`, `:app:web`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProjectPath(String);

impl ProjectPath {
    pub fn root() -> Self {
        Self(PATH_SEPARATOR.to_string())
    }

    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        if raw == ":" {
            return Ok(Self::root());
        }
        let Some(rest) = raw.strip_prefix(PATH_SEPARATOR) else {
            return Err(ModelError::InvalidPath(raw.to_string()));
        };
        let mut path = Self::root();
        for segment in rest.split(PATH_SEPARATOR) {
            path = path.child(segment)?;
        }
        Ok(path)
    }

    pub fn child(&self, name: &str) -> Result<Self, ModelError> {
        validate_segment(name)?;
        Ok(self.child_unchecked(name))
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Project names from the root down, excluding the root itself.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_SEPARATOR).filter(|s| !s.is_empty())
    }

    pub fn task(&self, name: &str) -> Result<TaskPath, ModelError> {
        validate_segment(name)?;
        Ok(TaskPath {
            project: self.clone(),
            name: name.to_string(),
        })
    }

    /// For segments taken from an already validated path.
    pub(crate) fn child_unchecked(&self, name: &str) -> Self {
        if self.is_root() {
            Self(format!(":{name}"))
        } else {
            Self(format!("{}:{name}", self.0))
        }
    }

    pub fn describe(&self) -> String {
        if self.is_root() {
            "root project".to_string()
        } else {
            format!("project '{}'", self.0)
        }
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique task identity: owning project plus task name, rendered `:app:compile`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskPath {
    project: ProjectPath,
    name: String,
}

impl TaskPath {
    /// Parses an absolute task path such as `:build` or `:lib:jar`.
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        if !raw.starts_with(PATH_SEPARATOR) || raw.len() < 2 {
            return Err(ModelError::InvalidPath(raw.to_string()));
        }
        let (project, name) = match raw.rfind(PATH_SEPARATOR) {
            Some(0) => (ProjectPath::root(), &raw[1..]),
            Some(idx) => (ProjectPath::parse(&raw[..idx])?, &raw[idx + 1..]),
            None => return Err(ModelError::InvalidPath(raw.to_string())),
        };
        project.task(name)
    }

    pub fn project(&self) -> &ProjectPath {
        &self.project
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TaskPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.project.is_root() {
            write!(f, ":{}", self.name)
        } else {
            write!(f, "{}:{}", self.project, self.name)
        }
    }
}

impl Serialize for TaskPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn validate_segment(name: &str) -> Result<(), ModelError> {
    if name.is_empty() || name.contains(PATH_SEPARATOR) || name.chars().any(char::is_whitespace) {
        return Err(ModelError::InvalidPath(name.to_string()));
    }
    Ok(())
}
