//! Capability links between steps.
//!
//! A [`StepLink`] names something a step can create or require. Steps never
//! reference each other directly; an edge exists whenever a requirement of
//! one step matches a creation of another.

use std::fmt;

/// Identity token for a producible or consumable capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StepLink {
    /// Matches every other link. Required by steps that must run last.
    AllSteps,
    /// A tag on an image stream outside the pipeline's namespace.
    ExternalImage {
        namespace: String,
        name: String,
        tag: String,
        /// Display alias, ignored when matching.
        alias: Option<String>,
    },
    /// A tag on the pipeline's own image stream.
    InternalImage(String),
    /// Every image the pipeline builds has been tagged.
    ImagesReady,
    /// The RPM repository is being served.
    RpmRepo,
    /// Release images have been tagged into the pipeline namespace.
    ReleaseImages,
}

impl StepLink {
    /// Link for an internal pipeline tag.
    pub fn internal(tag: impl Into<String>) -> Self {
        StepLink::InternalImage(tag.into())
    }

    /// Link for an external image without an alias.
    pub fn external(
        namespace: impl Into<String>,
        name: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        StepLink::ExternalImage {
            namespace: namespace.into(),
            name: name.into(),
            tag: tag.into(),
            alias: None,
        }
    }

    /// Exact identity. Used to keep a set of links free of repeats.
    pub fn same(&self, other: &StepLink) -> bool {
        self == other
    }

    /// Compatibility check. `self` is the requirement side, `other` the
    /// link some step creates.
    pub fn matches(&self, other: &StepLink) -> bool {
        match (self, other) {
            (StepLink::AllSteps, _) => true,
            (
                StepLink::ExternalImage {
                    namespace,
                    name,
                    tag,
                    ..
                },
                StepLink::ExternalImage {
                    namespace: other_namespace,
                    name: other_name,
                    tag: other_tag,
                    ..
                },
            ) => namespace == other_namespace && name == other_name && tag == other_tag,
            (StepLink::InternalImage(tag), StepLink::InternalImage(other_tag)) => tag == other_tag,
            (StepLink::ImagesReady, StepLink::ImagesReady)
            | (StepLink::RpmRepo, StepLink::RpmRepo)
            | (StepLink::ReleaseImages, StepLink::ReleaseImages) => true,
            _ => false,
        }
    }
}

impl fmt::Display for StepLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepLink::AllSteps => write!(f, "all steps"),
            StepLink::ExternalImage {
                namespace,
                name,
                tag,
                alias,
            } => {
                write!(f, "external image {}/{}:{}", namespace, name, tag)?;
                if let Some(alias) = alias {
                    write!(f, " (as {})", alias)?;
                }
                Ok(())
            }
            StepLink::InternalImage(tag) => write!(f, "internal image {}", tag),
            StepLink::ImagesReady => write!(f, "images ready"),
            StepLink::RpmRepo => write!(f, "rpm repo"),
            StepLink::ReleaseImages => write!(f, "release images"),
        }
    }
}

/// Drop links that are the same as one seen earlier, keeping first-seen order.
pub fn reduce_links(links: Vec<StepLink>) -> Vec<StepLink> {
    let mut reduced: Vec<StepLink> = Vec::with_capacity(links.len());
    for link in links {
        if !reduced.iter().any(|seen| seen.same(&link)) {
            reduced.push(link);
        }
    }
    reduced
}

/// Whether any of `created` satisfies any entry of `required`.
pub fn has_any_links(required: &[StepLink], created: &[StepLink]) -> bool {
    required
        .iter()
        .any(|want| created.iter().any(|have| want.matches(have)))
}

/// Whether every entry of `required` is satisfied by something in `satisfied`.
///
/// This is the gate that decides whether a dependent step may start.
pub fn has_all_links(satisfied: &[StepLink], required: &[StepLink]) -> bool {
    required
        .iter()
        .all(|want| satisfied.iter().any(|have| want.matches(have)))
}
