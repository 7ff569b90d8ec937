//! Font and gradient pools plus the random style picker.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;

use crate::error::{Error, Result};
use crate::roster::Language;

/// Opaque style resource (font or colour gradient) selected by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleResource {
    pub id: String,
    pub path: PathBuf,
}

impl StyleResource {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            path: PathBuf::from(&id),
            id,
        }
    }
}

/// Font + gradient applied to one caption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub font: StyleResource,
    pub gradient: StyleResource,
}

/// Per-language font pools and the shared gradient pool.
///
/// Every pool is non-empty; `new` and `load` refuse to build otherwise.
#[derive(Debug, Clone)]
pub struct StylePools {
    fonts: HashMap<Language, Vec<StyleResource>>,
    gradients: Vec<StyleResource>,
}

impl StylePools {
    /// Language whose fonts are used for untagged captions
    pub const DEFAULT_LANGUAGE: Language = Language::English;

    pub fn new(
        fonts: HashMap<Language, Vec<StyleResource>>,
        gradients: Vec<StyleResource>,
    ) -> Result<Self> {
        for lang in Language::ALL {
            if fonts.get(&lang).map_or(true, |pool| pool.is_empty()) {
                return Err(Error::EmptyPool(format!("fonts/{}", lang)));
            }
        }
        if gradients.is_empty() {
            return Err(Error::EmptyPool("gradients".to_string()));
        }
        Ok(Self { fonts, gradients })
    }

    /// Load pools from `<dir>/fonts/<language>/*` and `<dir>/gradients/*`
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(Error::MissingAssets(dir.to_path_buf()));
        }

        let mut fonts = HashMap::new();
        for lang in Language::ALL {
            let pool = list_resources(&dir.join("fonts").join(lang.as_str()))?;
            fonts.insert(lang, pool);
        }
        let gradients = list_resources(&dir.join("gradients"))?;

        let pools = Self::new(fonts, gradients)?;
        log::info!(
            "Style pools: {} english, {} korean, {} turkish fonts, {} gradients",
            pools.fonts(Language::English).len(),
            pools.fonts(Language::Korean).len(),
            pools.fonts(Language::Turkish).len(),
            pools.gradients().len()
        );
        Ok(pools)
    }

    pub fn fonts(&self, language: Language) -> &[StyleResource] {
        self.fonts.get(&language).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn gradients(&self) -> &[StyleResource] {
        &self.gradients
    }
}

/// Files in `dir` sorted by name; id is the file stem
fn list_resources(dir: &Path) -> Result<Vec<StyleResource>> {
    if !dir.is_dir() {
        return Err(Error::MissingAssets(dir.to_path_buf()));
    }

    let mut resources = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        resources.push(StyleResource {
            id: stem.to_string(),
            path,
        });
    }
    resources.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(resources)
}

/// Random style picker over shared, read-only pools
#[derive(Debug, Clone)]
pub struct StyleSelector {
    pools: Arc<StylePools>,
}

impl StyleSelector {
    pub fn new(pools: Arc<StylePools>) -> Self {
        Self { pools }
    }

    /// Uniform font from the language's pool (default pool when untagged),
    /// uniform gradient from the shared pool, drawn independently.
    pub fn pick_style<R: Rng + ?Sized>(&self, language: Option<Language>, rng: &mut R) -> Style {
        let fonts = self
            .pools
            .fonts(language.unwrap_or(StylePools::DEFAULT_LANGUAGE));
        let gradients = self.pools.gradients();

        let font = fonts[rng.gen_range(0..fonts.len())].clone();
        let gradient = gradients[rng.gen_range(0..gradients.len())].clone();
        Style { font, gradient }
    }
}
