use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a project's raw funding score is derived from its contributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Mechanism {
    /// 2 x sum of amounts.
    DirectDonations,
    /// (sum of sqrt(amount))^2.
    #[default]
    QuadraticFunding,
    /// Quadratic funding over donation-profile clusters.
    ClusterMapping,
}

impl Mechanism {
    pub const ALL: [Mechanism; 3] = [
        Mechanism::DirectDonations,
        Mechanism::QuadraticFunding,
        Mechanism::ClusterMapping,
    ];

    /// Accepts the display labels ("Quadratic Funding") as well as
    /// kebab/snake case spellings and the short forms `dd`, `qf`, `cm`.
    pub fn parse(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | '_' => ' ',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "direct donations" | "dd" => Ok(Mechanism::DirectDonations),
            "quadratic funding" | "qf" => Ok(Mechanism::QuadraticFunding),
            "cluster mapping" | "cm" => Ok(Mechanism::ClusterMapping),
            _ => bail!(
                "Unknown mechanism '{}': expected one of \
                 Direct Donations, Quadratic Funding, Cluster Mapping",
                s
            ),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mechanism::DirectDonations => "Direct Donations",
            Mechanism::QuadraticFunding => "Quadratic Funding",
            Mechanism::ClusterMapping => "Cluster Mapping",
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Mechanism {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Mechanism::parse(s)
    }
}

impl TryFrom<String> for Mechanism {
    type Error = anyhow::Error;

    fn try_from(s: String) -> Result<Self> {
        Mechanism::parse(&s)
    }
}

impl From<Mechanism> for String {
    fn from(m: Mechanism) -> Self {
        m.label().to_string()
    }
}
