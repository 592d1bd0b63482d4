use std::path::PathBuf;

xflags::xflags! {
    /// Builds a site from a source directory into an output directory.
    cmd refract {
        /// Settings file. Defaults to `prism.toml` if it exists.
        optional -c, --config config: PathBuf
        /// Source directory, overriding the settings.
        optional -s, --source source: PathBuf
        /// Output directory, overriding the settings.
        optional -o, --output output: PathBuf
        /// Rewrite every file, even those that are up to date.
        optional -f, --force
        /// Rebuild every time a line is read from standard input.
        optional -w, --watch
        /// Log progress at the `info` level.
        optional -v, --verbose
    }
}
