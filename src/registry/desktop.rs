use crate::error::RegistryError;
use crate::model::{Entry, LaunchHandle};
use crate::registry::Registry;
use directories::BaseDirs;
use log::{debug, info};
use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const DEFAULT_DATA_DIRS: &str = "/usr/local/share:/usr/share";

/// Freedesktop `.desktop` entries found under the XDG application directories.
pub struct DesktopRegistry {
    dirs: Vec<PathBuf>,
    locale: Locale,
}

impl DesktopRegistry {
    /// `dirs` are in priority order: an ID found in an earlier directory
    /// shadows the same ID in every later one.
    pub fn new(dirs: Vec<PathBuf>, locale: Locale) -> Self {
        Self { dirs, locale }
    }

    pub fn from_env(extra_dirs: &[PathBuf]) -> Self {
        let mut dirs = Vec::new();

        // BaseDirs honours XDG_DATA_HOME.
        if let Some(base_dirs) = BaseDirs::new() {
            dirs.push(base_dirs.data_dir().join("applications"));
        }

        let data_dirs = env::var("XDG_DATA_DIRS")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIRS.to_string());
        dirs.extend(
            data_dirs
                .split(':')
                .filter(|d| !d.is_empty())
                .map(|d| Path::new(d).join("applications")),
        );
        dirs.extend(extra_dirs.iter().cloned());

        Self::new(dirs, Locale::from_env())
    }
}

impl Registry for DesktopRegistry {
    fn name(&self) -> &str {
        "desktop"
    }

    fn enumerate_applications(&self) -> Result<Vec<Entry>, RegistryError> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        let mut any_dir = false;
        let mut last_error = None;

        for dir in &self.dirs {
            if !dir.is_dir() {
                continue;
            }
            any_dir = true;
            debug!("Scanning desktop files in {:?}", dir);

            for item in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
                let item = match item {
                    Ok(item) => item,
                    Err(err) => {
                        debug!("Skipping unreadable path under {:?}: {}", dir, err);
                        last_error = Some(err);
                        continue;
                    }
                };
                let path = item.path();
                if !item.file_type().is_file() || path.extension().and_then(|s| s.to_str()) != Some("desktop") {
                    continue;
                }
                let Some(id) = desktop_id(dir, path) else { continue };

                // Claimed even when the file turns out hidden, so a user-level
                // override can remove a system entry.
                if !seen.insert(id.clone()) {
                    debug!("{} shadowed by a higher-priority directory", id);
                    continue;
                }

                let content = match fs::read_to_string(path) {
                    Ok(content) => content,
                    Err(err) => {
                        debug!("Cannot read {:?}: {}", path, err);
                        continue;
                    }
                };
                if let Some(entry) = DesktopFile::parse(&content, &self.locale).into_entry(id, path) {
                    entries.push(entry);
                }
            }
        }

        if !any_dir {
            return Err(RegistryError::Unavailable("no application directories found".to_string()));
        }
        if entries.is_empty() {
            if let Some(err) = last_error {
                return Err(err.into());
            }
        }

        info!("DesktopRegistry: found {} entries", entries.len());
        Ok(entries)
    }
}

/// Relative path below the `applications` directory with `/` turned into `-`.
fn desktop_id(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("-"))
}

/// Message locale as `lang[_COUNTRY]`, used to pick `Name[..]` keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locale {
    lang: Option<String>,
    country: Option<String>,
}

impl Locale {
    pub fn from_env() -> Self {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find(|value| !value.is_empty())
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    pub fn parse(raw: &str) -> Self {
        let base = raw.split(['.', '@']).next().unwrap_or_default();
        if base.is_empty() || base == "C" || base == "POSIX" {
            return Self::default();
        }
        let (lang, country) = match base.split_once('_') {
            Some((lang, country)) => (lang, Some(country.to_string())),
            None => (base, None),
        };
        Self {
            lang: Some(lang.to_string()),
            country,
        }
    }

    /// Lower is better. `None` when the tag does not apply to this locale.
    fn rank(&self, tag: &str) -> Option<u8> {
        let lang = self.lang.as_deref()?;
        if tag.contains('@') {
            return None;
        }
        match tag.split_once('_') {
            Some((tag_lang, tag_country)) => {
                (tag_lang == lang && self.country.as_deref() == Some(tag_country)).then_some(0)
            }
            None => (tag == lang).then_some(1),
        }
    }
}

#[derive(Debug, Default)]
struct DesktopFile {
    name: Option<String>,
    localized_name: Option<(u8, String)>,
    exec: Option<String>,
    icon: Option<String>,
    kind: Option<String>,
    terminal: bool,
    no_display: bool,
    hidden: bool,
}

impl DesktopFile {
    fn parse(content: &str, locale: &Locale) -> Self {
        let mut file = Self::default();
        let mut in_entry_group = false;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') {
                in_entry_group = line == "[Desktop Entry]";
                continue;
            }
            if !in_entry_group {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else { continue };
            let key = key.trim_end();
            let value = unescape(value.trim_start());

            match key {
                "Name" => file.name = Some(value),
                "Exec" => file.exec = Some(value),
                "Icon" => file.icon = Some(value).filter(|v| !v.is_empty()),
                "Type" => file.kind = Some(value),
                "Terminal" => file.terminal = value == "true",
                "NoDisplay" => file.no_display = value == "true",
                "Hidden" => file.hidden = value == "true",
                _ => {
                    let tag = key.strip_prefix("Name[").and_then(|k| k.strip_suffix(']'));
                    if let Some(rank) = tag.and_then(|tag| locale.rank(tag)) {
                        let better = file.localized_name.as_ref().is_none_or(|(best, _)| rank < *best);
                        if better {
                            file.localized_name = Some((rank, value));
                        }
                    }
                }
            }
        }
        file
    }

    fn into_entry(self, id: String, path: &Path) -> Option<Entry> {
        if self.hidden || self.no_display || self.kind.as_deref() != Some("Application") {
            return None;
        }
        let name = self.localized_name.map(|(_, name)| name).or(self.name).filter(|n| !n.is_empty())?;
        let argv = expand_exec(self.exec.as_deref()?, &name, self.icon.as_deref(), path)?;

        let handle = LaunchHandle {
            id,
            argv,
            terminal: self.terminal,
            source: Some(path.to_path_buf()),
        };
        Some(Entry::new(name, handle).with_icon(self.icon))
    }
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Splits `Exec` into argv and expands its field codes. We never pass files
/// or URLs, so those codes disappear.
fn expand_exec(exec: &str, name: &str, icon: Option<&str>, path: &Path) -> Option<Vec<String>> {
    let mut argv = Vec::new();
    for arg in shlex::split(exec)? {
        match arg.as_str() {
            "%i" => {
                if let Some(icon) = icon {
                    argv.push("--icon".to_string());
                    argv.push(icon.to_string());
                }
            }
            "%f" | "%F" | "%u" | "%U" | "%d" | "%D" | "%n" | "%N" | "%v" | "%m" => {}
            _ => argv.push(expand_inline(&arg, name, path)),
        }
    }
    (!argv.is_empty() && !argv[0].is_empty()).then_some(argv)
}

fn expand_inline(arg: &str, name: &str, path: &Path) -> String {
    let mut out = String::with_capacity(arg.len());
    let mut chars = arg.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('c') => out.push_str(name),
            Some('k') => out.push_str(&path.to_string_lossy()),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn app(name: &str, exec: &str) -> String {
        format!("[Desktop Entry]\nType=Application\nName={}\nExec={}\n", name, exec)
    }

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.display_name.as_str()).collect()
    }

    #[test]
    fn scans_recursively_in_file_name_order() {
        let tmp = TempDir::new().unwrap();
        let apps = tmp.path().join("applications");
        write(&apps, "terminal.desktop", &app("Terminal", "kgx"));
        write(&apps, "firefox.desktop", &app("Firefox", "firefox %u"));
        write(&apps, "kde/files.desktop", &app("Files", "dolphin"));
        write(&apps, "README", "not a desktop file");

        let registry = DesktopRegistry::new(vec![apps], Locale::default());
        let entries = registry.enumerate_applications().unwrap();

        assert_eq!(names(&entries), ["Firefox", "Files", "Terminal"]);
        assert_eq!(entries[1].handle.id, "kde-files.desktop");
        assert_eq!(entries[0].handle.argv, ["firefox"]);
    }

    #[test]
    fn earlier_directory_shadows_later() {
        let user = TempDir::new().unwrap();
        let system = TempDir::new().unwrap();
        write(user.path(), "editor.desktop", &app("My Editor", "vim"));
        write(user.path(), "ads.desktop", "[Desktop Entry]\nType=Application\nName=Ads\nExec=ads\nHidden=true\n");
        write(system.path(), "editor.desktop", &app("Editor", "gedit"));
        write(system.path(), "ads.desktop", &app("Ads", "ads"));
        write(system.path(), "calc.desktop", &app("Calculator", "gnome-calculator"));

        let registry = DesktopRegistry::new(
            vec![user.path().to_path_buf(), system.path().to_path_buf()],
            Locale::default(),
        );
        let entries = registry.enumerate_applications().unwrap();

        assert_eq!(names(&entries), ["My Editor", "Calculator"]);
    }

    #[test]
    fn hidden_and_non_application_entries_are_skipped() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.desktop", "[Desktop Entry]\nType=Application\nName=A\nExec=a\nNoDisplay=true\n");
        write(tmp.path(), "b.desktop", "[Desktop Entry]\nType=Link\nName=B\nURL=https://example.org\n");
        write(tmp.path(), "c.desktop", "[Desktop Entry]\nName=C\nExec=c\n");
        write(tmp.path(), "d.desktop", "[Desktop Entry]\nType=Application\nName=D\n");
        write(tmp.path(), "e.desktop", &app("E", "e"));

        let registry = DesktopRegistry::new(vec![tmp.path().to_path_buf()], Locale::default());
        assert_eq!(names(&registry.enumerate_applications().unwrap()), ["E"]);
    }

    #[test]
    fn missing_directories_are_unavailable() {
        let tmp = TempDir::new().unwrap();
        let registry = DesktopRegistry::new(vec![tmp.path().join("nope")], Locale::default());
        assert!(matches!(registry.enumerate_applications(), Err(RegistryError::Unavailable(_))));
    }

    #[test]
    fn empty_directory_is_an_empty_catalog() {
        let tmp = TempDir::new().unwrap();
        let registry = DesktopRegistry::new(vec![tmp.path().to_path_buf()], Locale::default());
        assert!(registry.enumerate_applications().unwrap().is_empty());
    }

    #[test]
    fn only_desktop_entry_group_is_read() {
        let content = "[Desktop Entry]\nType=Application\nName=Browser\nExec=browser\nIcon=web\n\n\
                       [Desktop Action new-window]\nName=New Window\nExec=browser --new-window\n";
        let file = DesktopFile::parse(content, &Locale::default());
        let entry = file.into_entry("browser.desktop".to_string(), Path::new("/x/browser.desktop")).unwrap();
        assert_eq!(entry.display_name, "Browser");
        assert_eq!(entry.handle.argv, ["browser"]);
        assert_eq!(entry.icon.as_deref(), Some("web"));
    }

    #[test]
    fn localized_name_prefers_country_then_language() {
        let content = "[Desktop Entry]\nType=Application\nExec=files\nName=Files\n\
                       Name[de]=Dateien\nName[de_AT]=Dateien (AT)\nName[fr]=Fichiers\n";
        let pick = |locale: &str| {
            DesktopFile::parse(content, &Locale::parse(locale))
                .into_entry("f.desktop".to_string(), Path::new("/f.desktop"))
                .unwrap()
                .display_name
        };

        assert_eq!(pick("de_AT.UTF-8"), "Dateien (AT)");
        assert_eq!(pick("de_DE.UTF-8"), "Dateien");
        assert_eq!(pick("fr_FR@euro"), "Fichiers");
        assert_eq!(pick("ja_JP.UTF-8"), "Files");
        assert_eq!(pick("C"), "Files");
    }

    #[test]
    fn exec_field_codes_are_expanded() {
        let path = Path::new("/usr/share/applications/gimp.desktop");
        let argv = expand_exec(r#"gimp-2.10 %U --class="%c" %i --from %k 100%%"#, "GIMP", Some("gimp"), path).unwrap();
        assert_eq!(
            argv,
            [
                "gimp-2.10",
                "--class=GIMP",
                "--icon",
                "gimp",
                "--from",
                "/usr/share/applications/gimp.desktop",
                "100%",
            ]
        );
    }

    #[test]
    fn exec_icon_code_without_icon_is_dropped() {
        let argv = expand_exec("app %i %F", "App", None, Path::new("/a.desktop")).unwrap();
        assert_eq!(argv, ["app"]);
    }

    #[test]
    fn exec_with_only_field_codes_is_rejected() {
        assert!(expand_exec("%f", "X", None, Path::new("/x.desktop")).is_none());
        assert!(expand_exec("", "X", None, Path::new("/x.desktop")).is_none());
    }

    #[test]
    fn values_are_unescaped() {
        assert_eq!(unescape(r"a\sb\\c\td"), "a b\\c\td");
        assert_eq!(unescape(r"trailing\"), "trailing\\");
    }
}
