//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement. The
//! pipeline only ever talks to collaborators through them.

pub mod archive;
pub mod destination;
pub mod media;
pub mod session;
pub mod source;
pub mod storage;

pub use archive::{ArchiveLayer, LayerCodec};
pub use destination::{
    ContentItem, DestinationConnector, DestinationPlatform, FeatureRecord, FieldDefinition,
    Folder, ItemProperties, LayerField, LayerGeometry, PublishParameters, ServiceLayer,
};
pub use media::ImageSource;
pub use session::SessionStore;
pub use source::{ExternalDiagram, ExternalLayerType, SourceConnector, SourceSystem};
pub use storage::ObjectStorage;
