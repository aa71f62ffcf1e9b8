//! Country / continent guess from a link's top-level domain.
//!
//! Used when no publisher catalog is available. Only country-code TLDs are
//! listed; generic TLDs (`.com`, `.org`, `.net`, ...) have no region.

use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continent {
    Asia,
    Europe,
    NorthAmerica,
    SouthAmerica,
    Africa,
    Oceania,
}

impl Continent {
    pub fn label(self, lang: &str) -> &'static str {
        match (self, lang == "ja") {
            (Self::Asia, true) => "アジア",
            (Self::Europe, true) => "ヨーロッパ",
            (Self::NorthAmerica, true) => "北アメリカ",
            (Self::SouthAmerica, true) => "南アメリカ",
            (Self::Africa, true) => "アフリカ",
            (Self::Oceania, true) => "オセアニア",
            (Self::Asia, false) => "Asia",
            (Self::Europe, false) => "Europe",
            (Self::NorthAmerica, false) => "North America",
            (Self::SouthAmerica, false) => "South America",
            (Self::Africa, false) => "Africa",
            (Self::Oceania, false) => "Oceania",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub country_ja: &'static str,
    pub country_en: &'static str,
    pub continent: Continent,
}

impl Region {
    /// `(country, continent)` labels in the display language.
    pub fn labels(&self, lang: &str) -> (&'static str, &'static str) {
        let country = if lang == "ja" { self.country_ja } else { self.country_en };
        (country, self.continent.label(lang))
    }
}

static REGIONS: Lazy<HashMap<&'static str, Region>> = Lazy::new(|| {
    use Continent::*;
    [
        ("jp", "日本", "Japan", Asia),
        ("cn", "中国", "China", Asia),
        ("kr", "韓国", "South Korea", Asia),
        ("tw", "台湾", "Taiwan", Asia),
        ("hk", "香港", "Hong Kong", Asia),
        ("in", "インド", "India", Asia),
        ("sg", "シンガポール", "Singapore", Asia),
        ("id", "インドネシア", "Indonesia", Asia),
        ("th", "タイ", "Thailand", Asia),
        ("vn", "ベトナム", "Vietnam", Asia),
        ("ph", "フィリピン", "Philippines", Asia),
        ("my", "マレーシア", "Malaysia", Asia),
        ("pk", "パキスタン", "Pakistan", Asia),
        ("il", "イスラエル", "Israel", Asia),
        ("ae", "アラブ首長国連邦", "United Arab Emirates", Asia),
        ("sa", "サウジアラビア", "Saudi Arabia", Asia),
        ("qa", "カタール", "Qatar", Asia),
        ("tr", "トルコ", "Turkey", Asia),
        ("uk", "イギリス", "United Kingdom", Europe),
        ("ie", "アイルランド", "Ireland", Europe),
        ("fr", "フランス", "France", Europe),
        ("de", "ドイツ", "Germany", Europe),
        ("it", "イタリア", "Italy", Europe),
        ("es", "スペイン", "Spain", Europe),
        ("pt", "ポルトガル", "Portugal", Europe),
        ("nl", "オランダ", "Netherlands", Europe),
        ("be", "ベルギー", "Belgium", Europe),
        ("ch", "スイス", "Switzerland", Europe),
        ("at", "オーストリア", "Austria", Europe),
        ("se", "スウェーデン", "Sweden", Europe),
        ("no", "ノルウェー", "Norway", Europe),
        ("dk", "デンマーク", "Denmark", Europe),
        ("fi", "フィンランド", "Finland", Europe),
        ("pl", "ポーランド", "Poland", Europe),
        ("cz", "チェコ", "Czech Republic", Europe),
        ("gr", "ギリシャ", "Greece", Europe),
        ("ua", "ウクライナ", "Ukraine", Europe),
        ("ru", "ロシア", "Russia", Europe),
        ("us", "アメリカ", "United States", NorthAmerica),
        ("ca", "カナダ", "Canada", NorthAmerica),
        ("mx", "メキシコ", "Mexico", NorthAmerica),
        ("br", "ブラジル", "Brazil", SouthAmerica),
        ("ar", "アルゼンチン", "Argentina", SouthAmerica),
        ("cl", "チリ", "Chile", SouthAmerica),
        ("co", "コロンビア", "Colombia", SouthAmerica),
        ("pe", "ペルー", "Peru", SouthAmerica),
        ("za", "南アフリカ", "South Africa", Africa),
        ("eg", "エジプト", "Egypt", Africa),
        ("ng", "ナイジェリア", "Nigeria", Africa),
        ("ke", "ケニア", "Kenya", Africa),
        ("ma", "モロッコ", "Morocco", Africa),
        ("au", "オーストラリア", "Australia", Oceania),
        ("nz", "ニュージーランド", "New Zealand", Oceania),
    ]
    .into_iter()
    .map(|(tld, country_ja, country_en, continent)| {
        (
            tld,
            Region {
                country_ja,
                country_en,
                continent,
            },
        )
    })
    .collect()
});

/// Region of a host name by its last label, e.g. `www.example.co.jp` → Japan.
pub fn region_for_host(host: &str) -> Option<Region> {
    let tld = host.trim_end_matches('.').rsplit('.').next()?;
    REGIONS.get(tld.to_ascii_lowercase().as_str()).copied()
}
