//! Resource identifiers for fetchable map assets.
//!
//! A [`Resource`] names something the renderer wants (a tile, a style, a
//! sprite sheet, ...). Tile coordinates only exist on the tile variant, so a
//! non-tile resource can never carry stale tile data.

use serde::{Deserialize, Serialize};

/// Row numbering convention for tiles within a zoom level.
///
/// The two schemes differ by a vertical flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Xyz,
    Tms,
}

/// Tile coordinates carried by [`ResourceKind::Tile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileData {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub scheme: Scheme,
}

impl TileData {
    /// Row index of this tile in a TMS-numbered package.
    ///
    /// Returns `None` when the coordinates cannot exist at this zoom level,
    /// so the lookup can be answered as a miss without touching the store.
    pub fn flipped_row(&self) -> Option<i64> {
        if self.z >= 32 {
            return None;
        }
        let dim = 1i64 << self.z;
        let row = dim - i64::from(self.y) - 1;
        (row >= 0).then_some(row)
    }
}

/// What kind of asset a resource refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ResourceKind {
    Generic,
    Style,
    Source,
    Tile(TileData),
    Glyphs,
    SpriteImage,
    SpriteJson,
    Image,
}

/// Whether the caller needs this resource or merely wants it if cheap.
///
/// Advisory only: the cache lookup treats both the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Necessity {
    #[default]
    Required,
    Optional,
}

/// A fetchable map asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    #[serde(flatten)]
    pub kind: ResourceKind,
    pub url: String,
    #[serde(default)]
    pub necessity: Necessity,
}

impl Resource {
    /// Create a non-tile resource of the given kind.
    pub fn new(kind: ResourceKind, url: impl Into<String>) -> Self {
        Self { kind, url: url.into(), necessity: Necessity::Required }
    }

    pub fn style(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::Style, url)
    }

    pub fn source(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::Source, url)
    }

    pub fn glyphs(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::Glyphs, url)
    }

    pub fn sprite_image(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::SpriteImage, url)
    }

    pub fn sprite_json(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::SpriteJson, url)
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self::new(ResourceKind::Image, url)
    }

    /// Create a tile resource.
    pub fn tile(url: impl Into<String>, x: u32, y: u32, z: u32, scheme: Scheme) -> Self {
        Self::new(ResourceKind::Tile(TileData { x, y, z, scheme }), url)
    }

    /// Builder-style override of the necessity flag.
    pub fn with_necessity(mut self, necessity: Necessity) -> Self {
        self.necessity = necessity;
        self
    }

    /// Tile coordinates, present iff this is a tile resource.
    pub fn tile_data(&self) -> Option<&TileData> {
        match &self.kind {
            ResourceKind::Tile(tile) => Some(tile),
            _ => None,
        }
    }

    pub fn is_tile(&self) -> bool {
        self.tile_data().is_some()
    }
}

/// Substitute `{z}`, `{x}` and `{y}` in a tile URL template.
///
/// Only these three tokens are handled; anything else is left verbatim.
pub fn tile_url(template: &str, z: u32, x: u32, y: u32) -> String {
    template
        .replace("{z}", &z.to_string())
        .replace("{x}", &x.to_string())
        .replace("{y}", &y.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flipped_row() {
        let tile = TileData { x: 1, y: 1, z: 2, scheme: Scheme::Tms };
        assert_eq!(tile.flipped_row(), Some(2));

        let tile = TileData { x: 0, y: 0, z: 0, scheme: Scheme::Xyz };
        assert_eq!(tile.flipped_row(), Some(0));
    }

    #[test]
    fn test_flipped_row_is_an_involution() {
        for z in 0..6u32 {
            for y in 0..(1u32 << z) {
                let tile = TileData { x: 0, y, z, scheme: Scheme::Xyz };
                let row = tile.flipped_row().unwrap() as u32;
                let back = TileData { y: row, ..tile };
                assert_eq!(back.flipped_row(), Some(i64::from(y)));
            }
        }
    }

    #[test]
    fn test_flipped_row_out_of_range() {
        let tile = TileData { x: 0, y: 4, z: 2, scheme: Scheme::Xyz };
        assert_eq!(tile.flipped_row(), None);

        let tile = TileData { x: 0, y: 0, z: 40, scheme: Scheme::Xyz };
        assert_eq!(tile.flipped_row(), None);
    }

    #[test]
    fn test_tile_data_only_on_tiles() {
        let tile = Resource::tile("https://example.com/2/1/1.pbf", 1, 1, 2, Scheme::Xyz);
        assert!(tile.is_tile());
        assert_eq!(tile.tile_data().map(|t| t.z), Some(2));

        let style = Resource::style("https://example.com/style.json");
        assert!(!style.is_tile());
        assert!(style.tile_data().is_none());
    }

    #[test]
    fn test_with_necessity() {
        let res = Resource::image("https://example.com/a.png").with_necessity(Necessity::Optional);
        assert_eq!(res.necessity, Necessity::Optional);
        assert_eq!(Resource::image("x").necessity, Necessity::Required);
    }

    #[test]
    fn test_tile_url() {
        let url = tile_url("https://tiles.example.com/{z}/{x}/{y}.pbf", 3, 5, 7);
        assert_eq!(url, "https://tiles.example.com/3/5/7.pbf");
    }

    #[test]
    fn test_resource_serializes_kind_tag() {
        let json = serde_json::to_value(Resource::style("s")).unwrap();
        assert_eq!(json["kind"], "style");
        assert_eq!(json["url"], "s");
    }
}
