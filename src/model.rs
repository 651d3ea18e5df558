use chrono::{DateTime, Local};
use serde::Deserialize;

/// Which kind of analysis produced the result. Decides where topic records live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisCategory {
    Numerology,
    Astrology,
    Tarot,
    General,
}

impl AnalysisCategory {
    pub(crate) fn topic_containers(self) -> &'static [&'static str] {
        match self {
            AnalysisCategory::Numerology => &["numbers"],
            AnalysisCategory::Astrology => &["planets", "houses", "aspects"],
            AnalysisCategory::Tarot => &["cards", "positions"],
            AnalysisCategory::General => &["topics", "sections"],
        }
    }
}

impl std::str::FromStr for AnalysisCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "numerology" => Ok(AnalysisCategory::Numerology),
            "astrology" | "birth-chart" => Ok(AnalysisCategory::Astrology),
            "tarot" => Ok(AnalysisCategory::Tarot),
            "general" => Ok(AnalysisCategory::General),
            other => Err(format!("unknown analysis category: {other}")),
        }
    }
}

/// A titled chunk of narrative text; the atomic unit of page placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentSection {
    pub title: String,
    pub body: String,
}

pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub generated_at: DateTime<Local>,
    pub version_tag: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Container,
    Heading {
        #[serde(default = "default_heading_level")]
        level: u8,
    },
    Text,
    Image {
        src: String,
        #[serde(default)]
        width: Option<f32>,
        #[serde(default)]
        height: Option<f32>,
    },
    Divider,
    /// Interactive share button; meaningless in a static document.
    Share,
}

fn default_heading_level() -> u8 {
    2
}

/// Snapshot of a live view subtree, as handed over by the UI layer.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct VisualNode {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub collapsed: bool,
    /// `Some(false)` for a closed disclosure widget; its children are not shown.
    #[serde(default)]
    pub open: Option<bool>,
    #[serde(default)]
    pub line_clamp: Option<u32>,
    #[serde(default)]
    pub max_height: Option<f32>,
    #[serde(default)]
    pub children: Vec<VisualNode>,
}

impl VisualNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            text: None,
            hidden: false,
            collapsed: false,
            open: None,
            line_clamp: None,
            max_height: None,
            children: Vec::new(),
        }
    }

    pub fn text(kind: NodeKind, text: impl Into<String>) -> Self {
        let mut node = Self::new(kind);
        node.text = Some(text.into());
        node
    }

    pub fn with_children(mut self, children: Vec<VisualNode>) -> Self {
        self.children = children;
        self
    }
}

/// Which rendering path produced a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrategyKind {
    Structured,
    Capture,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub percent: u8,
    pub step: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Started,
    Succeeded { filename: String },
    Failed,
}

pub struct Report {
    pub bytes: Vec<u8>,
    pub filename: String,
    /// Physical pages, cover included.
    pub page_count: usize,
    pub content_pages: usize,
    pub strategy: StrategyKind,
}
