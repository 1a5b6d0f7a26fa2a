pub const APP_NAME: &str = "stratus";

/// File name of a build descriptor.
pub const DESCRIPTOR_FILE_NAME: &str = "Earthfile";

/// Separates the directory part of a target reference from the target name.
pub const TARGET_MARKER: char = '+';

/// `Line` of the synthetic copy command recorded for a followed `FROM +target`.
pub const SENTINEL_COPY_LINE: &str = "<sentinel>";

/// Directory names never descended into while walking Go packages.
pub const SKIPPED_PACKAGE_DIRS: &[&str] = &["testdata", "node_modules", "vendor"];

/// Statement emitted when a package imports itself or its own `cmd` directory.
pub const SELF_COPY_LINE: &str = "COPY --dir +src/* .";

/// Placeholder substituted for the project root in generated copy statements.
pub const TOP_ARG: &str = "$TOP";
