//! Utilities module.

use crate::criticality::Criticality;
use colored::Colorize;
use log::warn;
use std::path::Path;

/// Prints a warning through the logger.
pub fn print_warning<S: AsRef<str>>(warning: S) {
    warn!("{}", warning.as_ref())
}

/// Prints a finding in the terminal, colored by its criticality.
pub fn print_vulnerability<S: AsRef<str>>(text: S, criticality: Criticality) {
    let text = text.as_ref();
    let start = format!("Possible {} criticality vulnerability found!:", criticality);
    let (start, message) = match criticality {
        Criticality::Warning => (start.normal(), text.normal()),
        Criticality::Low => (start.cyan(), text.cyan()),
        Criticality::Medium => (start.yellow(), text.yellow()),
        Criticality::High | Criticality::Critical => (start.red(), text.red()),
    };
    println!("{} {}", start, message);
}

/// Gets the name of the package file, without its extension.
pub fn get_package_name<P: AsRef<Path>>(package: P) -> String {
    package
        .as_ref()
        .file_stem()
        .map_or_else(|| String::from("package"), |stem| stem.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::get_package_name;

    #[test]
    fn it_get_package_name() {
        assert_eq!(get_package_name("downloads/com.example.app.apk"), "com.example.app");
        assert_eq!(get_package_name("app.apk"), "app");
        assert_eq!(get_package_name("no-extension"), "no-extension");
        assert_eq!(get_package_name("/"), "package");
    }
}
