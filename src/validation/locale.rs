//! Locale message templates for rule violations.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::validation::schema::Violation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    En,
    Zh,
    ZhTw,
    Fr,
    Ja,
    Id,
    Nl,
    PtBr,
    Tr,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported locale: {0}")]
pub struct UnsupportedLocale(pub String);

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "en" => Ok(Locale::En),
            "zh" => Ok(Locale::Zh),
            "zh_tw" => Ok(Locale::ZhTw),
            "fr" => Ok(Locale::Fr),
            "ja" => Ok(Locale::Ja),
            "id" => Ok(Locale::Id),
            "nl" => Ok(Locale::Nl),
            "pt_br" => Ok(Locale::PtBr),
            "tr" => Ok(Locale::Tr),
            _ => Err(UnsupportedLocale(s.to_string())),
        }
    }
}

impl Locale {
    pub const ALL: [Locale; 9] = [
        Locale::En,
        Locale::Zh,
        Locale::ZhTw,
        Locale::Fr,
        Locale::Ja,
        Locale::Id,
        Locale::Nl,
        Locale::PtBr,
        Locale::Tr,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Zh => "zh",
            Locale::ZhTw => "zh_tw",
            Locale::Fr => "fr",
            Locale::Ja => "ja",
            Locale::Id => "id",
            Locale::Nl => "nl",
            Locale::PtBr => "pt_BR",
            Locale::Tr => "tr",
        }
    }

    fn template(self, rule: &str, numeric: bool) -> Option<&'static str> {
        let template = match (self, rule, numeric) {
            (Locale::En, "required", _) => "{field} is a required field",
            (Locale::En, "min", true) => "{field} must be {param} or greater",
            (Locale::En, "min", false) => "{field} must be at least {param} characters in length",
            (Locale::En, "max", true) => "{field} must be {param} or less",
            (Locale::En, "max", false) => "{field} must be a maximum of {param} characters in length",
            (Locale::En, "len", true) => "{field} must be equal to {param}",
            (Locale::En, "len", false) => "{field} must be {param} characters in length",
            (Locale::En, "email", _) => "{field} must be a valid email address",
            (Locale::En, "oneof", _) => "{field} must be one of [{param}]",

            (Locale::Zh, "required", _) => "{field}为必填字段",
            (Locale::Zh, "min", true) => "{field}必须大于或等于{param}",
            (Locale::Zh, "min", false) => "{field}长度必须至少为{param}个字符",
            (Locale::Zh, "max", true) => "{field}必须小于或等于{param}",
            (Locale::Zh, "max", false) => "{field}长度不能超过{param}个字符",
            (Locale::Zh, "len", true) => "{field}必须等于{param}",
            (Locale::Zh, "len", false) => "{field}长度必须是{param}个字符",
            (Locale::Zh, "email", _) => "{field}必须是一个有效的邮箱",
            (Locale::Zh, "oneof", _) => "{field}必须是[{param}]中的一个",

            (Locale::ZhTw, "required", _) => "{field}為必填欄位",
            (Locale::ZhTw, "min", true) => "{field}必須大於或等於{param}",
            (Locale::ZhTw, "min", false) => "{field}長度必須至少為{param}個字元",
            (Locale::ZhTw, "max", true) => "{field}必須小於或等於{param}",
            (Locale::ZhTw, "max", false) => "{field}長度不能超過{param}個字元",
            (Locale::ZhTw, "len", true) => "{field}必須等於{param}",
            (Locale::ZhTw, "len", false) => "{field}長度必須為{param}個字元",
            (Locale::ZhTw, "email", _) => "{field}必須是一個有效的信箱",
            (Locale::ZhTw, "oneof", _) => "{field}必須是[{param}]中的一個",

            (Locale::Fr, "required", _) => "{field} est un champ obligatoire",
            (Locale::Fr, "min", true) => "{field} doit être égal à {param} ou plus",
            (Locale::Fr, "min", false) => "{field} doit faire une taille d'au moins {param} caractères",
            (Locale::Fr, "max", true) => "{field} doit être égal à {param} ou moins",
            (Locale::Fr, "max", false) => "{field} doit faire une taille maximum de {param} caractères",
            (Locale::Fr, "len", true) => "{field} doit être égal à {param}",
            (Locale::Fr, "len", false) => "{field} doit faire une taille de {param} caractères",
            (Locale::Fr, "email", _) => "{field} doit être une adresse email valide",
            (Locale::Fr, "oneof", _) => "{field} doit être l'un des choix suivants [{param}]",

            (Locale::Ja, "required", _) => "{field}は必須フィールドです",
            (Locale::Ja, "min", true) => "{field}は{param}かより大きくなければなりません",
            (Locale::Ja, "min", false) => "{field}は{param}文字以上でなければなりません",
            (Locale::Ja, "max", true) => "{field}は{param}かより小さくなければなりません",
            (Locale::Ja, "max", false) => "{field}は最大{param}文字でなければなりません",
            (Locale::Ja, "len", true) => "{field}は{param}と等しくなければなりません",
            (Locale::Ja, "len", false) => "{field}の長さは{param}文字でなければなりません",
            (Locale::Ja, "email", _) => "{field}は正しいメールアドレスでなければなりません",
            (Locale::Ja, "oneof", _) => "{field}は[{param}]のうちのいずれかでなければなりません",

            (Locale::Id, "required", _) => "{field} wajib diisi",
            (Locale::Id, "min", true) => "{field} harus {param} atau lebih besar",
            (Locale::Id, "min", false) => "panjang minimal {field} adalah {param} karakter",
            (Locale::Id, "max", true) => "{field} harus {param} atau kurang",
            (Locale::Id, "max", false) => "panjang maksimal {field} adalah {param} karakter",
            (Locale::Id, "len", true) => "{field} harus sama dengan {param}",
            (Locale::Id, "len", false) => "panjang {field} harus {param} karakter",
            (Locale::Id, "email", _) => "{field} harus berupa alamat email yang valid",
            (Locale::Id, "oneof", _) => "{field} harus berupa salah satu dari [{param}]",

            (Locale::Nl, "required", _) => "{field} is een verplicht veld",
            (Locale::Nl, "min", true) => "{field} moet {param} of groter zijn",
            (Locale::Nl, "min", false) => "{field} moet minimaal {param} karakters lang zijn",
            (Locale::Nl, "max", true) => "{field} moet {param} of kleiner zijn",
            (Locale::Nl, "max", false) => "{field} mag maximaal {param} karakters lang zijn",
            (Locale::Nl, "len", true) => "{field} moet gelijk zijn aan {param}",
            (Locale::Nl, "len", false) => "{field} moet {param} karakters lang zijn",
            (Locale::Nl, "email", _) => "{field} moet een geldig email adres zijn",
            (Locale::Nl, "oneof", _) => "{field} moet een van de volgende zijn [{param}]",

            (Locale::PtBr, "required", _) => "{field} é um campo requerido",
            (Locale::PtBr, "min", true) => "{field} deve ser {param} ou superior",
            (Locale::PtBr, "min", false) => "{field} deve ter pelo menos {param} caracteres",
            (Locale::PtBr, "max", true) => "{field} deve ser {param} ou menor",
            (Locale::PtBr, "max", false) => "{field} deve ter no máximo {param} caracteres",
            (Locale::PtBr, "len", true) => "{field} deve ser igual a {param}",
            (Locale::PtBr, "len", false) => "{field} deve ter {param} caracteres",
            (Locale::PtBr, "email", _) => "{field} deve ser um endereço de e-mail válido",
            (Locale::PtBr, "oneof", _) => "{field} deve ser um de [{param}]",

            (Locale::Tr, "required", _) => "{field} zorunlu bir alandır",
            (Locale::Tr, "min", true) => "{field}, {param} veya daha büyük olmalıdır",
            (Locale::Tr, "min", false) => "{field} en az {param} karakter uzunluğunda olmalıdır",
            (Locale::Tr, "max", true) => "{field}, {param} veya daha az olmalıdır",
            (Locale::Tr, "max", false) => "{field} uzunluğu en fazla {param} karakter olmalıdır",
            (Locale::Tr, "len", true) => "{field}, {param} değerine eşit olmalıdır",
            (Locale::Tr, "len", false) => "{field} uzunluğu {param} karakter olmalıdır",
            (Locale::Tr, "email", _) => "{field} geçerli bir e-posta adresi olmalıdır",
            (Locale::Tr, "oneof", _) => "{field}, [{param}] değerlerinden biri olmalıdır",

            _ => return None,
        };
        Some(template)
    }

    fn fallback(self) -> &'static str {
        match self {
            Locale::En => "{field} failed on the {rule} validation",
            Locale::Zh => "{field}未通过{rule}校验",
            Locale::ZhTw => "{field}未通過{rule}驗證",
            Locale::Fr => "{field} a échoué à la validation {rule}",
            Locale::Ja => "{field}は{rule}の検証に失敗しました",
            Locale::Id => "{field} gagal pada validasi {rule}",
            Locale::Nl => "{field} voldoet niet aan de {rule} validatie",
            Locale::PtBr => "{field} falhou na validação {rule}",
            Locale::Tr => "{field}, {rule} doğrulamasında başarısız oldu",
        }
    }

    /// Render the message for `violation` naming the field `field`.
    pub fn render(self, violation: &Violation, field: &str) -> String {
        self.template(&violation.rule, violation.numeric)
            .unwrap_or_else(|| self.fallback())
            .replace("{field}", field)
            .replace("{param}", &violation.param)
            .replace("{rule}", &violation.rule)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("ZH".parse::<Locale>(), Ok(Locale::Zh));
        assert_eq!("en".parse::<Locale>(), Ok(Locale::En));
        assert_eq!("pt-BR".parse::<Locale>(), Ok(Locale::PtBr));
        assert_eq!("zh_TW".parse::<Locale>(), Ok(Locale::ZhTw));
        assert!("tlh".parse::<Locale>().is_err());
    }

    #[test]
    fn test_every_locale_covers_every_rule() {
        for locale in Locale::ALL {
            assert_eq!(locale.as_str().parse::<Locale>(), Ok(locale));
            for rule in ["required", "min", "max", "len", "email", "oneof"] {
                assert!(locale.template(rule, true).is_some(), "{locale} {rule}");
                assert!(locale.template(rule, false).is_some(), "{locale} {rule}");
            }
        }
    }

    #[test]
    fn test_numeric_and_text_templates_differ() {
        let numeric = Violation::new("Heartbeat", "min").with_param("1").with_value("-1", true);
        let text = Violation::new("Name", "min").with_param("3").with_value("ab", false);

        assert_eq!(Locale::En.render(&numeric, "heartbeat"), "heartbeat must be 1 or greater");
        assert_eq!(
            Locale::En.render(&text, "name"),
            "name must be at least 3 characters in length"
        );
        assert_eq!(Locale::Zh.render(&numeric, "heartbeat"), "heartbeat必须大于或等于1");
    }

    #[test]
    fn test_unknown_rule_falls_back() {
        let violation = Violation::new("Code", "uuid4");
        assert_eq!(Locale::En.render(&violation, "code"), "code failed on the uuid4 validation");
    }
}
