use crate::utils::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// 版本約束運算子，requirements 檔風格。雙字元運算子要先比對。
const OPERATORS: [&str; 7] = ["==", ">=", "<=", "~=", "!=", ">", "<"];

/// 一條依賴宣告：套件名稱加上可選的版本約束
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub name: String,
    pub constraint: Option<Constraint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub operator: String,
    pub version: String,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some(c) => write!(f, "{}{}{}", self.name, c.operator, c.version),
            None => write!(f, "{}", self.name),
        }
    }
}

/// 依賴清單：建置時讀一次，順序保留，之後不再變動
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    requirements: Vec<Requirement>,
}

impl Manifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BridgeError::IoError)?;
        Self::parse(&content)
    }

    /// 一行一條宣告，`#` 註解與空行跳過
    pub fn parse(content: &str) -> Result<Self> {
        let mut requirements = Vec::new();

        for (index, raw_line) in content.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            requirements.push(parse_line(line, index + 1)?);
        }

        Ok(Self { requirements })
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn len(&self) -> usize {
        self.requirements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

fn parse_line(line: &str, line_number: usize) -> Result<Requirement> {
    let malformed = |reason: String| BridgeError::DependencyResolutionError {
        package: line.to_string(),
        reason: format!("line {}: {}", line_number, reason),
    };

    let (name, constraint) = match OPERATORS
        .iter()
        .find_map(|op| line.find(op).map(|at| (at, *op)))
    {
        Some((at, operator)) => {
            let name = line[..at].trim();
            let version = line[at + operator.len()..].trim();
            if version.is_empty() {
                return Err(malformed(format!("dangling '{}' without a version", operator)));
            }
            (
                name,
                Some(Constraint {
                    operator: operator.to_string(),
                    version: version.to_string(),
                }),
            )
        }
        None => (line, None),
    };

    if !is_valid_package_name(name) {
        return Err(malformed(format!("invalid package name '{}'", name)));
    }

    Ok(Requirement {
        name: name.to_string(),
        constraint,
    })
}

fn is_valid_package_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().next().is_some_and(|c| c.is_ascii_alphanumeric())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_order_and_skips_noise() {
        let manifest = Manifest::parse(
            "# runtime deps\n\
             paho-mqtt==1.6.1\n\
             \n\
             requests>=2.28\n\
             pyyaml\n",
        )
        .unwrap();

        assert_eq!(manifest.len(), 3);
        assert_eq!(manifest.requirements()[0].to_string(), "paho-mqtt==1.6.1");
        assert_eq!(manifest.requirements()[1].to_string(), "requests>=2.28");
        assert_eq!(manifest.requirements()[2].to_string(), "pyyaml");
    }

    #[test]
    fn test_parse_all_operators() {
        for op in ["==", ">=", "<=", "~=", "!=", ">", "<"] {
            let line = format!("pkg{}1.0", op);
            let manifest = Manifest::parse(&line).unwrap();
            let req = &manifest.requirements()[0];
            assert_eq!(req.name, "pkg");
            assert_eq!(req.constraint.as_ref().unwrap().operator, op);
            assert_eq!(req.to_string(), line);
        }
    }

    #[test]
    fn test_parse_tolerates_spaces_around_operator() {
        let manifest = Manifest::parse("paho-mqtt == 1.6.1").unwrap();
        assert_eq!(manifest.requirements()[0].to_string(), "paho-mqtt==1.6.1");
    }

    #[test]
    fn test_malformed_lines_name_the_line_number() {
        let err = Manifest::parse("good==1.0\nbad==").unwrap_err();
        let BridgeError::DependencyResolutionError { reason, .. } = err else {
            panic!("expected DependencyResolutionError");
        };
        assert!(reason.contains("line 2"));

        assert!(Manifest::parse("==1.0").is_err());
        assert!(Manifest::parse("-leading-dash==1.0").is_err());
        assert!(Manifest::parse("has space==1.0").is_err());
    }

    #[test]
    fn test_empty_manifest_is_valid() {
        let manifest = Manifest::parse("# nothing but comments\n\n").unwrap();
        assert!(manifest.is_empty());
    }
}
