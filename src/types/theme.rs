/// Visual theme of the host page. The engine only re-emits styling when
/// this changes; the styles themselves belong to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapTheme {
    Light,
    Dark,
}

impl MapTheme {
    pub fn to_str(&self) -> &'static str {
        match self {
            MapTheme::Light => "light",
            MapTheme::Dark => "dark",
        }
    }
}
