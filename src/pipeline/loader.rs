//! EnvironmentLoader builder API for assembling a remapping environment.
//!
//! The loader collects the two mapping resources, the configuration and the host channels, and
//! builds the [`RemapEnvironment`] eagerly: both files are read, parsed and joined inside
//! [`EnvironmentLoader::build`], before any class unit is seen.
//!
//! Loading never fails. A resource that cannot be opened is logged at error level and its side
//! of the join is empty, which leaves the table empty and every lookup an identity.

use std::path::PathBuf;

use tracing::{error, info};

use crate::{
    config::RemapConfig,
    file::Resource,
    lookup::HostChannels,
    mappings::{tiny, tsrg},
    pipeline::RemapEnvironment,
};

/// Where a mapping file comes from.
#[derive(Debug)]
enum MappingSource {
    Path(PathBuf),
    Resource(Resource),
}

impl MappingSource {
    fn open(self, side: &str) -> Option<Resource> {
        match self {
            MappingSource::Resource(resource) => Some(resource),
            MappingSource::Path(path) => match Resource::from_path(&path) {
                Ok(resource) => Some(resource),
                Err(e) => {
                    error!(side, path = %path.display(), error = %e, "Could not open mapping file");
                    None
                }
            },
        }
    }
}

/// Builder for [`RemapEnvironment`] instances.
///
/// # Usage Examples
///
/// ```rust
/// use crossmap::{mappings::SymbolKind, pipeline::EnvironmentLoader, RemapConfig};
///
/// let environment = EnvironmentLoader::new()
///     .intermediate_bytes(
///         "mappings.tiny",
///         b"v1\tofficial\tintermediary\nMETHOD\tpkg/Owner\t()V\tfoo\tbar\n".to_vec(),
///     )
///     .final_bytes("joined.tsrg", b"pkg/Owner pkg2/Owner2\n\tfoo\t()V\tbaz\n".to_vec())
///     .with_config(RemapConfig::production())
///     .build();
///
/// assert_eq!(environment.lookup().translate(SymbolKind::Method, "bar"), "baz");
/// assert_eq!(environment.lookup().translate(SymbolKind::Method, "unknown"), "unknown");
/// ```
#[derive(Debug, Default)]
pub struct EnvironmentLoader {
    intermediate: Option<MappingSource>,
    finals: Option<MappingSource>,
    config: RemapConfig,
    channels: Option<HostChannels>,
}

impl EnvironmentLoader {
    /// Create a loader with no mapping resources and the production configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the intermediate (Tiny v1) mappings from a file.
    ///
    /// The file is opened during [`EnvironmentLoader::build`]; a missing file is not an error.
    #[must_use]
    pub fn intermediate_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.intermediate = Some(MappingSource::Path(path.into()));
        self
    }

    /// Use an in-memory buffer as the intermediate (Tiny v1) mappings.
    #[must_use]
    pub fn intermediate_bytes(mut self, name: impl Into<String>, data: Vec<u8>) -> Self {
        self.intermediate = Some(MappingSource::Resource(Resource::from_mem(name, data)));
        self
    }

    /// Read the final (TSRG v1) mappings from a file.
    ///
    /// The file is opened during [`EnvironmentLoader::build`]; a missing file is not an error.
    #[must_use]
    pub fn final_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.finals = Some(MappingSource::Path(path.into()));
        self
    }

    /// Use an in-memory buffer as the final (TSRG v1) mappings.
    #[must_use]
    pub fn final_bytes(mut self, name: impl Into<String>, data: Vec<u8>) -> Self {
        self.finals = Some(MappingSource::Resource(Resource::from_mem(name, data)));
        self
    }

    /// Set the remapping configuration.
    #[must_use]
    pub fn with_config(mut self, config: RemapConfig) -> Self {
        self.config = config;
        self
    }

    /// Provide the host's channel registry for host-delegated mode.
    #[must_use]
    pub fn with_host_channels(mut self, channels: HostChannels) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Load both mapping files, join them, and build the environment.
    #[must_use]
    pub fn build(self) -> RemapEnvironment {
        let intermediate = self.intermediate.and_then(|source| source.open("intermediate"));
        let finals = self.finals.and_then(|source| source.open("final"));

        let intermediate_records = tiny::load(intermediate.as_ref());
        let final_records = tsrg::load(finals.as_ref());

        let environment = RemapEnvironment::from_records(
            &intermediate_records,
            &final_records,
            self.config,
            self.channels,
        );

        info!(
            mode = %environment.config().mode,
            entries = environment.table().stats().joined,
            "Remapping environment ready"
        );
        environment
    }
}
