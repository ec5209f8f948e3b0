use crate::{
    error::{Error, Result},
    post::BlogPost,
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Statistics collected while reading the posts directory.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    /// Files matching the post patterns
    pub matched_files: usize,

    /// Posts parsed successfully
    pub posts: usize,

    /// Files skipped because they could not be read or parsed
    pub skipped: usize,
}

/// Markdown posts stored one file per slug.
#[derive(Debug, Clone)]
pub struct PostStore {
    dir: PathBuf,
    patterns: GlobSet,
}

impl PostStore {
    /// Creates a store over `dir`, reading files whose names match `patterns`.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid glob.
    pub fn new(dir: impl Into<PathBuf>, patterns: &[String]) -> Result<Self> {
        Ok(Self {
            dir: dir.into(),
            patterns: build_globset(patterns)?,
        })
    }

    /// Path a post with `slug` is stored at.
    #[must_use]
    pub fn path_for(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{slug}.md"))
    }

    /// Finds a post file already using `slug`.
    ///
    /// Any file in the directory whose stem is `slug` and whose name matches
    /// the post patterns counts, so `<slug>.mdx` blocks `<slug>.md`.
    #[must_use]
    pub fn existing(&self, slug: &str) -> Option<PathBuf> {
        let target = self.path_for(slug);
        if target.exists() {
            return Some(target);
        }

        let entries = fs::read_dir(&self.dir).ok()?;
        entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                path.is_file()
                    && path.file_stem().is_some_and(|stem| stem == slug)
                    && path
                        .file_name()
                        .is_some_and(|name| self.patterns.is_match(Path::new(name)))
            })
    }

    /// Reads every post under the directory.
    ///
    /// Hidden files are ignored. Files without valid front-matter are
    /// skipped with a warning. A missing directory yields no posts.
    ///
    /// # Errors
    ///
    /// Returns an error if the path exists but is not a directory.
    pub fn load_all(&self) -> Result<(Vec<BlogPost>, LoadStats)> {
        let mut stats = LoadStats::default();
        if !self.dir.exists() {
            warn!("Posts directory {} does not exist", self.dir.display());
            return Ok((Vec::new(), stats));
        }
        if !self.dir.is_dir() {
            return Err(Error::config(format!(
                "Posts path is not a directory: {}",
                self.dir.display()
            )));
        }

        let walker = WalkBuilder::new(&self.dir)
            .hidden(true)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .follow_links(false)
            .build();

        let mut posts = Vec::new();
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error: {}", e);
                    stats.skipped += 1;
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let Some(name) = entry.path().file_name() else {
                continue;
            };
            if !self.patterns.is_match(Path::new(name)) {
                continue;
            }
            stats.matched_files += 1;

            match Self::read_post(entry.path()) {
                Ok(post) => posts.push(post),
                Err(e) => {
                    warn!("Skipping {}: {}", entry.path().display(), e);
                    stats.skipped += 1;
                }
            }
        }

        // Порядок обхода не гарантирован
        posts.sort_by(|a, b| a.path.cmp(&b.path));
        stats.posts = posts.len();
        debug!(
            "Loaded {} posts from {} ({} skipped)",
            stats.posts,
            self.dir.display(),
            stats.skipped
        );
        Ok((posts, stats))
    }

    fn read_post(path: &Path) -> Result<BlogPost> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut post = BlogPost::parse(&content)?;
        post.path = Some(path.to_path_buf());
        Ok(post)
    }

    /// Writes a new post file for `slug`, refusing to replace an existing one.
    ///
    /// The file is opened with `create_new`, so a concurrent writer or a
    /// leftover file makes this fail instead of overwriting.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SlugExists`] if a post with this slug is already
    /// there, or an IO error if the directory or file cannot be written.
    pub fn create(&self, slug: &str, content: &str) -> Result<PathBuf> {
        if let Some(path) = self.existing(slug) {
            return Err(Error::SlugExists {
                slug: slug.to_string(),
                path,
            });
        }
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;

        let path = self.path_for(slug);
        let mut file = match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::SlugExists {
                    slug: slug.to_string(),
                    path,
                });
            }
            Err(e) => return Err(Error::io(&path, e)),
        };

        let written = file
            .write_all(content.as_bytes())
            .and_then(|()| file.sync_all());
        if let Err(e) = written {
            drop(file);
            // Не оставляем полузаписанный пост
            let _ = fs::remove_file(&path);
            return Err(Error::io(&path, e));
        }

        info!("Wrote post {}", path.display());
        Ok(path)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();

    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| Error::config(format!("Invalid glob pattern '{pattern}': {e}")))?;
        builder.add(glob);
    }

    builder
        .build()
        .map_err(|e| Error::config(format!("Failed to build glob set: {e}")))
}
