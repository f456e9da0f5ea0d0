use crate::config::Language;

/// Spelled-out number words for one language.
///
/// Each supported language implements this once; the grammar builder never
/// branches on the language itself.
pub trait NumeralLexicon: Send + Sync {
    /// Cardinal spelling of `n` ("twenty one").
    fn cardinal(&self, n: u32) -> String;

    /// Ordinal spelling of `n` ("twenty first"), if the language table
    /// covers it.
    fn ordinal(&self, n: u32) -> Option<String>;
}

pub fn lexicon_for(language: Language) -> &'static dyn NumeralLexicon {
    match language {
        Language::English => &English,
        Language::Russian => &Russian,
    }
}

pub struct English;

const EN_UNITS: [&str; 10] = [
    "", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];
const EN_TEENS: [&str; 10] = [
    "ten",
    "eleven",
    "twelve",
    "thirteen",
    "fourteen",
    "fifteen",
    "sixteen",
    "seventeen",
    "eighteen",
    "nineteen",
];
const EN_TENS: [&str; 10] = [
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];

const EN_ORDINAL_BASE: [(u32, &str); 28] = [
    (1, "first"),
    (2, "second"),
    (3, "third"),
    (4, "fourth"),
    (5, "fifth"),
    (6, "sixth"),
    (7, "seventh"),
    (8, "eighth"),
    (9, "ninth"),
    (10, "tenth"),
    (11, "eleventh"),
    (12, "twelfth"),
    (13, "thirteenth"),
    (14, "fourteenth"),
    (15, "fifteenth"),
    (16, "sixteenth"),
    (17, "seventeenth"),
    (18, "eighteenth"),
    (19, "nineteenth"),
    (20, "twentieth"),
    (30, "thirtieth"),
    (40, "fortieth"),
    (50, "fiftieth"),
    (60, "sixtieth"),
    (70, "seventieth"),
    (80, "eightieth"),
    (90, "ninetieth"),
    (100, "hundredth"),
];

fn en_ordinal_base(n: u32) -> Option<&'static str> {
    EN_ORDINAL_BASE
        .iter()
        .find(|(k, _)| *k == n)
        .map(|(_, w)| *w)
}

impl NumeralLexicon for English {
    fn cardinal(&self, n: u32) -> String {
        match n {
            0 => "zero".to_string(),
            1..=9 => EN_UNITS[n as usize].to_string(),
            10..=19 => EN_TEENS[(n - 10) as usize].to_string(),
            20..=99 => {
                let t = EN_TENS[(n / 10) as usize];
                if n % 10 == 0 {
                    t.to_string()
                } else {
                    format!("{} {}", t, EN_UNITS[(n % 10) as usize])
                }
            }
            100..=999 => {
                let h = EN_UNITS[(n / 100) as usize];
                if n % 100 == 0 {
                    format!("{} hundred", h)
                } else {
                    format!("{} hundred {}", h, self.cardinal(n % 100))
                }
            }
            _ => n.to_string(),
        }
    }

    fn ordinal(&self, n: u32) -> Option<String> {
        if let Some(base) = en_ordinal_base(n) {
            return Some(base.to_string());
        }
        if n < 100 {
            let tens = (n / 10) * 10;
            let unit_tail = en_ordinal_base(n % 10)?;
            if en_ordinal_base(tens).is_some() {
                return Some(format!("{} {}", self.cardinal(tens), unit_tail));
            }
            return None;
        }
        if n < 1000 {
            let hundreds = (n / 100) * 100;
            let rem = n % 100;
            if rem == 0 {
                return en_ordinal_base(hundreds).map(|w| w.to_string());
            }
            let tail = self
                .ordinal(rem)
                .unwrap_or_else(|| self.cardinal(rem));
            return Some(format!("{} {}", self.cardinal(hundreds), tail));
        }
        None
    }
}

pub struct Russian;

const RU_UNITS: [&str; 10] = [
    "",
    "один",
    "два",
    "три",
    "четыре",
    "пять",
    "шесть",
    "семь",
    "восемь",
    "девять",
];
const RU_TEENS: [&str; 10] = [
    "десять",
    "одиннадцать",
    "двенадцать",
    "тринадцать",
    "четырнадцать",
    "пятнадцать",
    "шестнадцать",
    "семнадцать",
    "восемнадцать",
    "девятнадцать",
];
const RU_TENS: [&str; 10] = [
    "",
    "десять",
    "двадцать",
    "тридцать",
    "сорок",
    "пятьдесят",
    "шестьдесят",
    "семьдесят",
    "восемьдесят",
    "девяносто",
];
const RU_HUNDREDS: [&str; 10] = [
    "",
    "сто",
    "двести",
    "триста",
    "четыреста",
    "пятьсот",
    "шестьсот",
    "семьсот",
    "восемьсот",
    "девятьсот",
];
const RU_ORDINALS: [&str; 10] = [
    "первая",
    "вторая",
    "третья",
    "четвертая",
    "пятая",
    "шестая",
    "седьмая",
    "восьмая",
    "девятая",
    "десятая",
];

impl NumeralLexicon for Russian {
    fn cardinal(&self, n: u32) -> String {
        match n {
            0 => "ноль".to_string(),
            1..=9 => RU_UNITS[n as usize].to_string(),
            10..=19 => RU_TEENS[(n - 10) as usize].to_string(),
            20..=99 => {
                let t = RU_TENS[(n / 10) as usize];
                if n % 10 == 0 {
                    t.to_string()
                } else {
                    format!("{} {}", t, RU_UNITS[(n % 10) as usize])
                }
            }
            100..=999 => {
                let h = RU_HUNDREDS[(n / 100) as usize];
                if n % 100 == 0 {
                    h.to_string()
                } else {
                    format!("{} {}", h, self.cardinal(n % 100))
                }
            }
            _ => n.to_string(),
        }
    }

    fn ordinal(&self, n: u32) -> Option<String> {
        // Feminine forms agreeing with "глава"; table covers 1..=10.
        match n {
            1..=10 => Some(RU_ORDINALS[(n - 1) as usize].to_string()),
            _ => None,
        }
    }
}
