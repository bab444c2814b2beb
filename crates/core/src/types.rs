/// Backend identifier of an annotation. Opaque to the widget.
pub type AnnotationId = String;

/// Backend identifier of an update, assigned by the server on creation.
pub type UpdateId = String;

/// Access code identifying a user (proposer or viewer).
pub type AccessCode = String;

/// Locally generated display index of a thread entry.
pub type EntryIndex = u32;
