//! 三语文本值对象
//!
//! 每个可本地化字段都保存为显式的 `{en, ar, fr}` 记录，
//! 通过 [`pick`] 按界面语言取值

use serde::{Deserialize, Serialize};

/// 界面语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ar,
    #[default]
    Fr,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Ar, Language::Fr];

    /// ISO 639-1 代码
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
            Language::Fr => "fr",
        }
    }

    /// 是否为从右到左书写
    pub fn is_rtl(&self) -> bool {
        matches!(self, Language::Ar)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // 接受 "fr" 以及 "fr-MA" / "ar_MA" 这类区域写法
        let primary = s
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_lowercase();
        match primary.as_str() {
            "en" => Ok(Language::En),
            "ar" => Ok(Language::Ar),
            "fr" => Ok(Language::Fr),
            _ => Err(format!("Unknown language: {}", s)),
        }
    }
}

/// 三语文本
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub ar: String,
    #[serde(default)]
    pub fr: String,
}

impl LocalizedText {
    pub fn new(en: impl Into<String>, ar: impl Into<String>, fr: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
            fr: fr.into(),
        }
    }

    /// 三种语言使用同一文本
    pub fn uniform(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            en: text.clone(),
            ar: text.clone(),
            fr: text,
        }
    }

    /// 指定语言的原始值 (可能为空)
    pub fn get(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.en,
            Language::Ar => &self.ar,
            Language::Fr => &self.fr,
        }
    }

    pub fn set(&mut self, lang: Language, text: impl Into<String>) {
        let text = text.into();
        match lang {
            Language::En => self.en = text,
            Language::Ar => self.ar = text,
            Language::Fr => self.fr = text,
        }
    }

    /// 按语言取值
    ///
    /// 目标语言为空时回退到英文，再回退到第一个非空值
    pub fn pick(&self, lang: Language) -> &str {
        let wanted = self.get(lang);
        if !wanted.trim().is_empty() {
            return wanted;
        }
        if !self.en.trim().is_empty() {
            return &self.en;
        }
        Language::ALL
            .iter()
            .map(|l| self.get(*l))
            .find(|text| !text.trim().is_empty())
            .unwrap_or_default()
    }

    /// 三种语言均为空
    pub fn is_blank(&self) -> bool {
        Language::ALL.iter().all(|l| self.get(*l).trim().is_empty())
    }
}

/// 带有主显示文本的本地化记录
pub trait Localized {
    fn localized(&self) -> &LocalizedText;
}

impl Localized for LocalizedText {
    fn localized(&self) -> &LocalizedText {
        self
    }
}

/// 取记录在指定语言下的显示文本
pub fn pick<T: Localized + ?Sized>(record: &T, lang: Language) -> &str {
    record.localized().pick(lang)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!("fr".parse::<Language>().unwrap(), Language::Fr);
        assert_eq!("ar-MA".parse::<Language>().unwrap(), Language::Ar);
        assert_eq!("EN_us".parse::<Language>().unwrap(), Language::En);
        assert!("de".parse::<Language>().is_err());
        assert!(Language::Ar.is_rtl());
        assert!(!Language::Fr.is_rtl());
    }

    #[test]
    fn test_pick_requested_language() {
        let text = LocalizedText::new("Fire drill", "تمرين الحريق", "Exercice incendie");
        assert_eq!(text.pick(Language::Ar), "تمرين الحريق");
        assert_eq!(pick(&text, Language::Fr), "Exercice incendie");
    }

    #[test]
    fn test_pick_falls_back_to_english_then_first_non_empty() {
        let text = LocalizedText::new("Kitchen audit", "", "");
        assert_eq!(text.pick(Language::Fr), "Kitchen audit");

        let text = LocalizedText::new("", "", "Audit cuisine");
        assert_eq!(text.pick(Language::Ar), "Audit cuisine");

        assert_eq!(LocalizedText::default().pick(Language::En), "");
        assert!(LocalizedText::default().is_blank());
        assert!(LocalizedText::uniform("  ").is_blank());
    }

    #[test]
    fn test_serde_shape() {
        let text = LocalizedText::uniform("HACCP");
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json["ar"], "HACCP");
        let lang: Language = serde_json::from_str("\"ar\"").unwrap();
        assert_eq!(lang, Language::Ar);
    }
}
