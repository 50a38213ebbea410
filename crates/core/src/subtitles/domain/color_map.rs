use std::collections::HashMap;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ColorMapError {
    #[error("unknown color '{0}'")]
    UnknownColor(String),
}

/// CSS named colors, sorted by name so lookups can binary search.
const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("aliceblue", [240, 248, 255]),
    ("antiquewhite", [250, 235, 215]),
    ("aqua", [0, 255, 255]),
    ("aquamarine", [127, 255, 212]),
    ("azure", [240, 255, 255]),
    ("beige", [245, 245, 220]),
    ("bisque", [255, 228, 196]),
    ("black", [0, 0, 0]),
    ("blanchedalmond", [255, 235, 205]),
    ("blue", [0, 0, 255]),
    ("blueviolet", [138, 43, 226]),
    ("brown", [165, 42, 42]),
    ("burlywood", [222, 184, 135]),
    ("cadetblue", [95, 158, 160]),
    ("chartreuse", [127, 255, 0]),
    ("chocolate", [210, 105, 30]),
    ("coral", [255, 127, 80]),
    ("cornflowerblue", [100, 149, 237]),
    ("cornsilk", [255, 248, 220]),
    ("crimson", [220, 20, 60]),
    ("cyan", [0, 255, 255]),
    ("darkblue", [0, 0, 139]),
    ("darkcyan", [0, 139, 139]),
    ("darkgoldenrod", [184, 134, 11]),
    ("darkgray", [169, 169, 169]),
    ("darkgreen", [0, 100, 0]),
    ("darkgrey", [169, 169, 169]),
    ("darkkhaki", [189, 183, 107]),
    ("darkmagenta", [139, 0, 139]),
    ("darkolivegreen", [85, 107, 47]),
    ("darkorange", [255, 140, 0]),
    ("darkorchid", [153, 50, 204]),
    ("darkred", [139, 0, 0]),
    ("darksalmon", [233, 150, 122]),
    ("darkseagreen", [143, 188, 143]),
    ("darkslateblue", [72, 61, 139]),
    ("darkslategray", [47, 79, 79]),
    ("darkslategrey", [47, 79, 79]),
    ("darkturquoise", [0, 206, 209]),
    ("darkviolet", [148, 0, 211]),
    ("deeppink", [255, 20, 147]),
    ("deepskyblue", [0, 191, 255]),
    ("dimgray", [105, 105, 105]),
    ("dimgrey", [105, 105, 105]),
    ("dodgerblue", [30, 144, 255]),
    ("firebrick", [178, 34, 34]),
    ("floralwhite", [255, 250, 240]),
    ("forestgreen", [34, 139, 34]),
    ("fuchsia", [255, 0, 255]),
    ("gainsboro", [220, 220, 220]),
    ("ghostwhite", [248, 248, 255]),
    ("gold", [255, 215, 0]),
    ("goldenrod", [218, 165, 32]),
    ("gray", [128, 128, 128]),
    ("green", [0, 128, 0]),
    ("greenyellow", [173, 255, 47]),
    ("grey", [128, 128, 128]),
    ("honeydew", [240, 255, 240]),
    ("hotpink", [255, 105, 180]),
    ("indianred", [205, 92, 92]),
    ("indigo", [75, 0, 130]),
    ("ivory", [255, 255, 240]),
    ("khaki", [240, 230, 140]),
    ("lavender", [230, 230, 250]),
    ("lavenderblush", [255, 240, 245]),
    ("lawngreen", [124, 252, 0]),
    ("lemonchiffon", [255, 250, 205]),
    ("lightblue", [173, 216, 230]),
    ("lightcoral", [240, 128, 128]),
    ("lightcyan", [224, 255, 255]),
    ("lightgoldenrodyellow", [250, 250, 210]),
    ("lightgray", [211, 211, 211]),
    ("lightgreen", [144, 238, 144]),
    ("lightgrey", [211, 211, 211]),
    ("lightpink", [255, 182, 193]),
    ("lightsalmon", [255, 160, 122]),
    ("lightseagreen", [32, 178, 170]),
    ("lightskyblue", [135, 206, 250]),
    ("lightslategray", [119, 136, 153]),
    ("lightslategrey", [119, 136, 153]),
    ("lightsteelblue", [176, 196, 222]),
    ("lightyellow", [255, 255, 224]),
    ("lime", [0, 255, 0]),
    ("limegreen", [50, 205, 50]),
    ("linen", [250, 240, 230]),
    ("magenta", [255, 0, 255]),
    ("maroon", [128, 0, 0]),
    ("mediumaquamarine", [102, 205, 170]),
    ("mediumblue", [0, 0, 205]),
    ("mediumorchid", [186, 85, 211]),
    ("mediumpurple", [147, 112, 219]),
    ("mediumseagreen", [60, 179, 113]),
    ("mediumslateblue", [123, 104, 238]),
    ("mediumspringgreen", [0, 250, 154]),
    ("mediumturquoise", [72, 209, 204]),
    ("mediumvioletred", [199, 21, 133]),
    ("midnightblue", [25, 25, 112]),
    ("mintcream", [245, 255, 250]),
    ("mistyrose", [255, 228, 225]),
    ("moccasin", [255, 228, 181]),
    ("navajowhite", [255, 222, 173]),
    ("navy", [0, 0, 128]),
    ("oldlace", [253, 245, 230]),
    ("olive", [128, 128, 0]),
    ("olivedrab", [107, 142, 35]),
    ("orange", [255, 165, 0]),
    ("orangered", [255, 69, 0]),
    ("orchid", [218, 112, 214]),
    ("palegoldenrod", [238, 232, 170]),
    ("palegreen", [152, 251, 152]),
    ("paleturquoise", [175, 238, 238]),
    ("palevioletred", [219, 112, 147]),
    ("papayawhip", [255, 239, 213]),
    ("peachpuff", [255, 218, 185]),
    ("peru", [205, 133, 63]),
    ("pink", [255, 192, 203]),
    ("plum", [221, 160, 221]),
    ("powderblue", [176, 224, 230]),
    ("purple", [128, 0, 128]),
    ("rebeccapurple", [102, 51, 153]),
    ("red", [255, 0, 0]),
    ("rosybrown", [188, 143, 143]),
    ("royalblue", [65, 105, 225]),
    ("saddlebrown", [139, 69, 19]),
    ("salmon", [250, 128, 114]),
    ("sandybrown", [244, 164, 96]),
    ("seagreen", [46, 139, 87]),
    ("seashell", [255, 245, 238]),
    ("sienna", [160, 82, 45]),
    ("silver", [192, 192, 192]),
    ("skyblue", [135, 206, 235]),
    ("slateblue", [106, 90, 205]),
    ("slategray", [112, 128, 144]),
    ("slategrey", [112, 128, 144]),
    ("snow", [255, 250, 250]),
    ("springgreen", [0, 255, 127]),
    ("steelblue", [70, 130, 180]),
    ("tan", [210, 180, 140]),
    ("teal", [0, 128, 128]),
    ("thistle", [216, 191, 216]),
    ("tomato", [255, 99, 71]),
    ("turquoise", [64, 224, 208]),
    ("violet", [238, 130, 238]),
    ("wheat", [245, 222, 179]),
    ("white", [255, 255, 255]),
    ("whitesmoke", [245, 245, 245]),
    ("yellow", [255, 255, 0]),
    ("yellowgreen", [154, 205, 50]),
];

/// A parsed display color plus the identifier it was written as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextColor {
    name: String,
    rgb: [u8; 3],
}

impl TextColor {
    /// Parses a CSS-style name (`red`), `#rgb` or `#rrggbb`.
    pub fn parse(spec: &str) -> Result<Self, ColorMapError> {
        let name = spec.trim().to_lowercase();
        let rgb = match name.strip_prefix('#') {
            Some(hex) => parse_hex(hex),
            None => NAMED_COLORS
                .binary_search_by(|(n, _)| n.cmp(&name.as_str()))
                .ok()
                .map(|i| NAMED_COLORS[i].1),
        }
        .ok_or_else(|| ColorMapError::UnknownColor(spec.trim().to_string()))?;
        Ok(Self { name, rgb })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rgb(&self) -> [u8; 3] {
        self.rgb
    }

    pub fn rgba(&self) -> [u8; 4] {
        [self.rgb[0], self.rgb[1], self.rgb[2], 255]
    }
}

fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Word to display-color lookup used to highlight terms in subtitles.
///
/// Keys are stored lowercased and lookups lowercase their input, so the map
/// is case-insensitive. Read-only once built.
#[derive(Clone, Debug)]
pub struct ColorMap {
    colors: HashMap<String, TextColor>,
    default: TextColor,
}

impl ColorMap {
    pub fn new(default: TextColor) -> Self {
        Self {
            colors: HashMap::new(),
            default,
        }
    }

    /// Builds a map from `(word, color)` pairs; later duplicates win.
    pub fn from_pairs<I, W, C>(pairs: I, default_color: &str) -> Result<Self, ColorMapError>
    where
        I: IntoIterator<Item = (W, C)>,
        W: AsRef<str>,
        C: AsRef<str>,
    {
        let mut map = Self::new(TextColor::parse(default_color)?);
        for (word, color) in pairs {
            map.insert(word.as_ref(), TextColor::parse(color.as_ref())?);
        }
        Ok(map)
    }

    pub fn insert(&mut self, word: &str, color: TextColor) {
        self.colors.insert(word.trim().to_lowercase(), color);
    }

    pub fn resolve(&self, word: &str) -> &TextColor {
        self.colors
            .get(&word.to_lowercase())
            .unwrap_or(&self.default)
    }

    pub fn default_color(&self) -> &TextColor {
        &self.default
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::named("red", [255, 0, 0])]
    #[case::named_mixed_case("Gold", [255, 215, 0])]
    #[case::short_hex("#0f0", [0, 255, 0])]
    #[case::long_hex("#1E90FF", [30, 144, 255])]
    #[case::padded("  white ", [255, 255, 255])]
    #[case::dark_orange("darkorange", [255, 140, 0])]
    #[case::orchid("orchid", [218, 112, 214])]
    #[case::light_coral("LightCoral", [240, 128, 128])]
    #[case::rebecca_purple("rebeccapurple", [102, 51, 153])]
    #[case::first_entry("aliceblue", [240, 248, 255])]
    #[case::last_entry("yellowgreen", [154, 205, 50])]
    fn test_parse_color(#[case] spec: &str, #[case] expected: [u8; 3]) {
        assert_eq!(TextColor::parse(spec).unwrap().rgb(), expected);
    }

    #[rstest]
    #[case::unknown_name("blurple")]
    #[case::bad_hex("#12345")]
    #[case::non_hex_digits("#zzzzzz")]
    #[case::empty("")]
    fn test_parse_color_rejects(#[case] spec: &str) {
        assert!(TextColor::parse(spec).is_err());
    }

    #[test]
    fn test_named_table_is_sorted() {
        assert!(NAMED_COLORS.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(NAMED_COLORS.len(), 148);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let map = ColorMap::from_pairs([("RED", "red")], "white").unwrap();
        assert_eq!(map.resolve("red"), map.resolve("RED"));
        assert_eq!(map.resolve("Red").name(), "red");
    }

    #[test]
    fn test_unmapped_words_use_default() {
        let map = ColorMap::from_pairs([("hello", "red")], "white").unwrap();
        assert_eq!(map.resolve("world").rgb(), [255, 255, 255]);
        assert_eq!(map.resolve("anything"), map.default_color());
    }

    #[test]
    fn test_later_duplicate_wins() {
        let map = ColorMap::from_pairs([("sun", "red"), ("Sun", "gold")], "white").unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.resolve("sun").name(), "gold");
    }

    #[test]
    fn test_unknown_color_fails_construction() {
        let err = ColorMap::from_pairs([("sun", "sunshine")], "white").unwrap_err();
        assert_eq!(err, ColorMapError::UnknownColor("sunshine".to_string()));
    }

    #[test]
    fn test_rgba_is_opaque() {
        assert_eq!(TextColor::parse("blue").unwrap().rgba(), [0, 0, 255, 255]);
    }
}
