use thiserror::Error;

pub type Result<T> = std::result::Result<T, HeatmapError>;

#[derive(Error, Debug)]
pub enum HeatmapError {
    #[error("Unsupported period: {0} (expected one of hourly, daily, weekly, monthly, quarterly, yearly)")]
    UnsupportedPeriod(String),
    #[error("Invalid depth override: {0} (expected path:depth)")]
    InvalidDepthOverride(String),
    #[error("Invalid depth: {0} (must be at least 1)")]
    InvalidDepth(usize),
    #[error("Invalid scale: {0} (must be a finite number greater than zero)")]
    InvalidScale(f64),
    #[error("Invalid color: {0} (expected comma separated #rrggbb values)")]
    InvalidColor(String),
    #[error("Period out of range: {0}")]
    PeriodOutOfRange(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Git repository error: {0}")]
    GitRepo(String),
    #[error("Template error: {0}")]
    Template(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Git error: {0}")]
    Git(#[from] Box<gix::open::Error>),
    #[error("Git discover error: {0}")]
    GitDiscover(#[from] Box<gix::discover::Error>),
    #[error("Object find error: {0}")]
    ObjectFind(#[from] Box<gix::object::find::existing::Error>),
    #[error("Object find with conversion error: {0}")]
    ObjectFindConv(#[from] Box<gix::object::find::existing::with_conversion::Error>),
    #[error("Object decode error: {0}")]
    ObjectDecode(#[from] Box<gix::objs::decode::Error>),
    #[error("Commit error: {0}")]
    Commit(#[from] Box<gix::object::commit::Error>),
    #[error("Signature time error: {0}")]
    SignatureTime(#[from] Box<gix::date::parse::Error>),
    #[error("Reference find error: {0}")]
    RefFind(#[from] Box<gix::reference::find::existing::Error>),
    #[error("Head peel error: {0}")]
    HeadPeel(#[from] Box<gix::head::peel::to_commit::Error>),
    #[error("Diff tree to tree error: {0}")]
    DiffTreeToTree(#[from] Box<gix::repository::diff_tree_to_tree::Error>),
}

// Manual From implementations for unboxed to boxed conversions
impl From<gix::open::Error> for HeatmapError {
    fn from(err: gix::open::Error) -> Self {
        HeatmapError::Git(Box::new(err))
    }
}

impl From<gix::discover::Error> for HeatmapError {
    fn from(err: gix::discover::Error) -> Self {
        HeatmapError::GitDiscover(Box::new(err))
    }
}

impl From<gix::object::find::existing::Error> for HeatmapError {
    fn from(err: gix::object::find::existing::Error) -> Self {
        HeatmapError::ObjectFind(Box::new(err))
    }
}

impl From<gix::object::find::existing::with_conversion::Error> for HeatmapError {
    fn from(err: gix::object::find::existing::with_conversion::Error) -> Self {
        HeatmapError::ObjectFindConv(Box::new(err))
    }
}

impl From<gix::objs::decode::Error> for HeatmapError {
    fn from(err: gix::objs::decode::Error) -> Self {
        HeatmapError::ObjectDecode(Box::new(err))
    }
}

impl From<gix::object::commit::Error> for HeatmapError {
    fn from(err: gix::object::commit::Error) -> Self {
        HeatmapError::Commit(Box::new(err))
    }
}

impl From<gix::date::parse::Error> for HeatmapError {
    fn from(err: gix::date::parse::Error) -> Self {
        HeatmapError::SignatureTime(Box::new(err))
    }
}

impl From<gix::reference::find::existing::Error> for HeatmapError {
    fn from(err: gix::reference::find::existing::Error) -> Self {
        HeatmapError::RefFind(Box::new(err))
    }
}

impl From<gix::head::peel::to_commit::Error> for HeatmapError {
    fn from(err: gix::head::peel::to_commit::Error) -> Self {
        HeatmapError::HeadPeel(Box::new(err))
    }
}

impl From<gix::repository::diff_tree_to_tree::Error> for HeatmapError {
    fn from(err: gix::repository::diff_tree_to_tree::Error) -> Self {
        HeatmapError::DiffTreeToTree(Box::new(err))
    }
}
