//! Text normalization: rewrites digits, dates, times, currency, units,
//! percentages, phone numbers, and arithmetic into spelled-out readings.
//!
//! Passes run in a fixed order so later passes never re-consume tokens
//! an earlier pass already rewrote (year rewriting, for instance, eats
//! its digits before the generic number pass runs).

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::text::numbers::{digits_spelled, int_to_chinese, int_to_english, int_to_english_ordinal};
use crate::text::utils::is_cjk_char;

/// Target reading language. `Auto` decides per match from the
/// surrounding script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Zh,
    En,
    Auto,
}

/// Rewrite every recognized numeric construct in `text` into words.
pub fn normalize(text: &str, lang: Language) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut result = text.to_string();
    result = normalize_date_time(&result, lang);
    result = normalize_currency(&result, lang);
    result = normalize_phone_numbers(&result, lang);
    result = normalize_percentages(&result, lang);
    result = normalize_units(&result, lang);
    result = normalize_math(&result, lang);
    result = normalize_numbers(&result, lang);
    result
}

/// Majority script within ten characters on either side of `pos`;
/// Chinese wins ties.
fn resolve(lang: Language, text: &str, pos: usize) -> Language {
    if lang != Language::Auto {
        return lang;
    }

    let before = text[..pos].chars().rev().take(10);
    let after = text[pos..].chars().take(10);
    let mut zh = 0usize;
    let mut en = 0usize;
    for c in before.chain(after) {
        if is_cjk_char(c) {
            zh += 1;
        } else if c.is_ascii_alphabetic() {
            en += 1;
        }
    }

    if en > zh {
        Language::En
    } else {
        Language::Zh
    }
}

fn int_words(value: i64, lang: Language) -> String {
    match lang {
        Language::En => int_to_english(value),
        _ => int_to_chinese(value),
    }
}

/// Cardinal reading of a digit string, digit-by-digit after any decimal
/// point. Falls back to digit spelling when the integer part overflows.
fn number_words(num: &str, lang: Language) -> String {
    let en = lang == Language::En;
    let (int_part, frac_part) = match num.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (num, None),
    };

    let mut out = if int_part.is_empty() || int_part == "0" {
        if en { "zero".to_string() } else { "零".to_string() }
    } else {
        match int_part.parse::<i64>() {
            Ok(v) => int_words(v, lang),
            Err(_) => digits_spelled(int_part, en),
        }
    };

    if let Some(frac) = frac_part {
        out.push_str(if en { " point" } else { "点" });
        for c in frac.chars().filter(|c| c.is_ascii_digit()) {
            if en {
                out.push(' ');
            }
            out.push_str(&digits_spelled(&c.to_string(), en));
        }
    }

    out
}

fn year_to_words(year: i64, lang: Language) -> String {
    if lang != Language::En {
        // Chinese years read digit by digit: 2024 -> 二零二四.
        return digits_spelled(&year.to_string(), false);
    }

    if (2000..2010).contains(&year) {
        if year == 2000 {
            "two thousand".to_string()
        } else {
            format!("two thousand and {}", int_to_english(year - 2000))
        }
    } else if (2010..2100).contains(&year) {
        format!("{} {}", int_to_english(year / 100), int_to_english(year % 100))
    } else if (1000..2000).contains(&year) {
        let century = year / 100;
        let rest = year % 100;
        if rest == 0 {
            format!("{} hundred", int_to_english(century))
        } else if rest < 10 {
            format!("{} oh {}", int_to_english(century), int_to_english(rest))
        } else {
            format!("{} {}", int_to_english(century), int_to_english(rest))
        }
    } else {
        int_to_english(year)
    }
}

// -----------------------------------------------------------------------------
// Dates, times, bare years
// -----------------------------------------------------------------------------

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})[-/年](\d{1,2})[-/月](\d{1,2})日?").unwrap());

static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2}):(\d{2})(?::(\d{2}))?").unwrap());

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})年").unwrap());

const ENGLISH_MONTHS: [&str; 13] = [
    "", "January", "February", "March", "April", "May", "June", "July", "August", "September",
    "October", "November", "December",
];

fn normalize_date_time(text: &str, lang: Language) -> String {
    let dated = DATE_RE.replace_all(text, |caps: &Captures| {
        let year: i64 = caps[1].parse().unwrap_or(0);
        let month: i64 = caps[2].parse().unwrap_or(0);
        let day: i64 = caps[3].parse().unwrap_or(0);
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return caps[0].to_string();
        }

        let pos = caps.get(0).unwrap().start();
        match resolve(lang, text, pos) {
            Language::En => format!(
                "{} {}, {}",
                ENGLISH_MONTHS[month as usize],
                int_to_english_ordinal(day),
                year_to_words(year, Language::En)
            ),
            _ => format!(
                "{}年{}月{}日",
                year_to_words(year, Language::Zh),
                int_to_chinese(month),
                int_to_chinese(day)
            ),
        }
    });

    let dated = dated.into_owned();
    let timed = TIME_RE.replace_all(&dated, |caps: &Captures| {
        let hour: i64 = caps[1].parse().unwrap_or(0);
        let minute: i64 = caps[2].parse().unwrap_or(0);
        let second: Option<i64> = caps.get(3).map(|m| m.as_str().parse().unwrap_or(0));

        let pos = caps.get(0).unwrap().start();
        match resolve(lang, &dated, pos) {
            Language::En => {
                let period = if hour >= 12 { "PM" } else { "AM" };
                let hour12 = match hour % 12 {
                    0 => 12,
                    h => h,
                };
                let mut out = if minute == 0 {
                    format!("{} {}", int_to_english(hour12), period)
                } else {
                    format!(
                        "{} {} {}",
                        int_to_english(hour12),
                        int_to_english(minute),
                        period
                    )
                };
                if let Some(sec) = second {
                    out.push_str(&format!(" and {} seconds", int_to_english(sec)));
                }
                out
            }
            _ => {
                let mut out = format!("{}点", int_to_chinese(hour));
                if minute > 0 {
                    out.push_str(&format!("{}分", int_to_chinese(minute)));
                }
                if let Some(sec) = second {
                    out.push_str(&format!("{}秒", int_to_chinese(sec)));
                }
                out
            }
        }
    });

    let timed = timed.into_owned();
    YEAR_RE
        .replace_all(&timed, |caps: &Captures| {
            let year: i64 = caps[1].parse().unwrap_or(0);
            let pos = caps.get(0).unwrap().start();
            match resolve(lang, &timed, pos) {
                Language::En => year_to_words(year, Language::En),
                _ => format!("{}年", year_to_words(year, Language::Zh)),
            }
        })
        .into_owned()
}

// -----------------------------------------------------------------------------
// Currency
// -----------------------------------------------------------------------------

fn currency_symbol(c: char) -> Option<(&'static str, &'static str)> {
    match c {
        '¥' | '￥' => Some(("元", "yuan")),
        '$' => Some(("美元", "dollars")),
        '€' => Some(("欧元", "euros")),
        '£' => Some(("英镑", "pounds")),
        '₩' => Some(("韩元", "won")),
        '₹' => Some(("卢比", "rupees")),
        _ => None,
    }
}

static CURRENCY_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*(块钱|美元|美金|人民币|元|块)").unwrap());

fn currency_suffix_words(suffix: &str) -> (&'static str, &'static str) {
    match suffix {
        "元" => ("元", "yuan"),
        "块" => ("块", "yuan"),
        "块钱" => ("块钱", "yuan"),
        "美元" => ("美元", "US dollars"),
        "美金" => ("美金", "US dollars"),
        _ => ("人民币", "RMB"),
    }
}

fn normalize_currency(text: &str, lang: Language) -> String {
    // Symbol prefixes need a character walk: digits before a thousands
    // separator are skipped, which a plain regex substitution cannot do.
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if let Some((zh_word, en_word)) = currency_symbol(c) {
            let mut num = String::new();
            let mut has_dot = false;
            let mut j = i + 1;
            while j < chars.len() {
                let cj = chars[j].1;
                if cj.is_ascii_digit() {
                    num.push(cj);
                    j += 1;
                } else if cj == '.' && !has_dot {
                    num.push('.');
                    has_dot = true;
                    j += 1;
                } else if cj == ',' || cj == '，' {
                    j += 1;
                } else {
                    break;
                }
            }
            if num.ends_with('.') {
                num.pop();
                j -= 1;
            }

            if !num.is_empty() {
                let eff = resolve(lang, text, pos);
                let amount = number_words(&num, eff);
                if eff == Language::En {
                    out.push_str(&amount);
                    out.push(' ');
                    out.push_str(en_word);
                } else {
                    out.push_str(&amount);
                    out.push_str(zh_word);
                }
                i = j;
                continue;
            }
        }

        out.push(c);
        i += 1;
    }

    let prefixed = out;
    CURRENCY_SUFFIX_RE
        .replace_all(&prefixed, |caps: &Captures| {
            let pos = caps.get(0).unwrap().start();
            let eff = resolve(lang, &prefixed, pos);
            let amount = number_words(&caps[1], eff);
            let (zh_word, en_word) = currency_suffix_words(&caps[2]);
            if eff == Language::En {
                format!("{amount} {en_word}")
            } else {
                format!("{amount}{zh_word}")
            }
        })
        .into_owned()
}

// -----------------------------------------------------------------------------
// Phone numbers
// -----------------------------------------------------------------------------

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    // ASCII word boundaries: a phone number directly after a CJK
    // character must still match.
    Regex::new(
        r"(?-u:\b)(?:1[3-9]\d{9}|1[3-9]\d[-\s]?\d{4}[-\s]?\d{4}|\d{3,4}[-\s]?\d{7,8})(?-u:\b)",
    )
    .unwrap()
});

fn normalize_phone_numbers(text: &str, lang: Language) -> String {
    PHONE_RE
        .replace_all(text, |caps: &Captures| {
            let m = caps.get(0).unwrap();
            let eff = resolve(lang, text, m.start());
            digits_spelled(m.as_str(), eff == Language::En)
        })
        .into_owned()
}

// -----------------------------------------------------------------------------
// Percentages
// -----------------------------------------------------------------------------

static PERCENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").unwrap());

fn normalize_percentages(text: &str, lang: Language) -> String {
    PERCENT_RE
        .replace_all(text, |caps: &Captures| {
            let pos = caps.get(0).unwrap().start();
            let eff = resolve(lang, text, pos);
            let amount = number_words(&caps[1], eff);
            if eff == Language::En {
                format!("{amount} percent")
            } else {
                format!("百分之{amount}")
            }
        })
        .into_owned()
}

// -----------------------------------------------------------------------------
// Units
// -----------------------------------------------------------------------------

const UNITS: &[(&str, &str, &str)] = &[
    // length
    ("km", "公里", "kilometers"),
    ("m", "米", "meters"),
    ("cm", "厘米", "centimeters"),
    ("mm", "毫米", "millimeters"),
    ("mi", "英里", "miles"),
    ("ft", "英尺", "feet"),
    ("in", "英寸", "inches"),
    // weight
    ("kg", "公斤", "kilograms"),
    ("g", "克", "grams"),
    ("mg", "毫克", "milligrams"),
    ("lb", "磅", "pounds"),
    ("oz", "盎司", "ounces"),
    // volume
    ("L", "升", "liters"),
    ("l", "升", "liters"),
    ("ml", "毫升", "milliliters"),
    ("mL", "毫升", "milliliters"),
    // temperature
    ("°C", "摄氏度", "degrees Celsius"),
    ("°F", "华氏度", "degrees Fahrenheit"),
    ("℃", "摄氏度", "degrees Celsius"),
    ("℉", "华氏度", "degrees Fahrenheit"),
    // area
    ("m²", "平方米", "square meters"),
    ("km²", "平方公里", "square kilometers"),
    ("m2", "平方米", "square meters"),
    ("km2", "平方公里", "square kilometers"),
    // speed
    ("km/h", "公里每小时", "kilometers per hour"),
    ("m/s", "米每秒", "meters per second"),
    ("mph", "英里每小时", "miles per hour"),
    // data
    ("KB", "千字节", "kilobytes"),
    ("MB", "兆字节", "megabytes"),
    ("GB", "吉字节", "gigabytes"),
    ("TB", "太字节", "terabytes"),
    ("Mbps", "兆比特每秒", "megabits per second"),
    ("Gbps", "吉比特每秒", "gigabits per second"),
];

static UNIT_RE: Lazy<Regex> = Lazy::new(|| {
    // Longest glyph first so "km/h" wins over "km" and "m".
    let mut sorted: Vec<&str> = UNITS.iter().map(|(u, _, _)| *u).collect();
    sorted.sort_by_key(|u| std::cmp::Reverse(u.len()));
    let alternation = sorted
        .iter()
        .map(|u| regex::escape(u))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(\d+(?:\.\d+)?)({alternation})")).unwrap()
});

fn unit_words(unit: &str) -> Option<(&'static str, &'static str)> {
    UNITS
        .iter()
        .find(|(u, _, _)| *u == unit)
        .map(|(_, zh, en)| (*zh, *en))
}

fn normalize_units(text: &str, lang: Language) -> String {
    UNIT_RE
        .replace_all(text, |caps: &Captures| {
            let m = caps.get(0).unwrap();
            // "10MB" should match, "10MBit" should not.
            if text[m.end()..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphanumeric())
            {
                return m.as_str().to_string();
            }

            let eff = resolve(lang, text, m.start());
            let amount = number_words(&caps[1], eff);
            match unit_words(&caps[2]) {
                Some((zh_word, en_word)) => {
                    if eff == Language::En {
                        format!("{amount} {en_word}")
                    } else {
                        format!("{amount}{zh_word}")
                    }
                }
                None => m.as_str().to_string(),
            }
        })
        .into_owned()
}

// -----------------------------------------------------------------------------
// Math operators
// -----------------------------------------------------------------------------

fn math_operator(op: &str) -> Option<(&'static str, &'static str)> {
    match op {
        "+" => Some(("加", "plus")),
        "-" | "−" => Some(("减", "minus")),
        "*" | "×" => Some(("乘", "times")),
        "÷" | "/" => Some(("除以", "divided by")),
        "=" => Some(("等于", "equals")),
        "≠" => Some(("不等于", "not equal to")),
        ">" => Some(("大于", "greater than")),
        "<" => Some(("小于", "less than")),
        "≥" | ">=" => Some(("大于等于", "greater than or equal to")),
        "≤" | "<=" => Some(("小于等于", "less than or equal to")),
        "^" => Some(("的", "to the power of")),
        "√" => Some(("根号", "square root of")),
        "±" => Some(("正负", "plus or minus")),
        _ => None,
    }
}

fn normalize_math(text: &str, lang: Language) -> String {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];

        // Two-character operators (>=, <=) first.
        if i + 1 < chars.len() {
            let pair: String = [c, chars[i + 1].1].iter().collect();
            if let Some((zh_word, en_word)) = math_operator(&pair) {
                if resolve(lang, text, pos) == Language::En {
                    out.push_str(&format!(" {en_word} "));
                } else {
                    out.push_str(zh_word);
                }
                i += 2;
                continue;
            }
        }

        // Leave the sign of a scientific-notation tail (2e-3) for the
        // number pass.
        if matches!(c, '+' | '-')
            && i >= 2
            && matches!(chars[i - 1].1, 'e' | 'E')
            && chars[i - 2].1.is_ascii_digit()
            && chars.get(i + 1).is_some_and(|&(_, n)| n.is_ascii_digit())
        {
            out.push(c);
            i += 1;
            continue;
        }

        let single = c.to_string();
        if let Some((zh_word, en_word)) = math_operator(&single) {
            let eff = resolve(lang, text, pos);

            // A minus directly before a digit, at the start or after
            // another operator, reads as a sign.
            let mut is_negative = false;
            if matches!(c, '-' | '−')
                && chars.get(i + 1).is_some_and(|&(_, n)| n.is_ascii_digit())
            {
                is_negative = match i.checked_sub(1).map(|p| chars[p].1) {
                    None => true,
                    Some(prev) => {
                        math_operator(&prev.to_string()).is_some()
                            || matches!(prev, '(' | '（' | ' ')
                    }
                };
            }

            if is_negative {
                out.push_str(if eff == Language::En { "negative " } else { "负" });
            } else if eff == Language::En {
                out.push_str(&format!(" {en_word} "));
            } else {
                out.push_str(zh_word);
            }
            i += 1;
            continue;
        }

        out.push(c);
        i += 1;
    }

    out
}

// -----------------------------------------------------------------------------
// Generic numbers
// -----------------------------------------------------------------------------

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?(?:[eE][+-]?\d+)?").unwrap());

fn is_mobile_number(digits: &str) -> bool {
    digits.len() == 11
        && digits.starts_with('1')
        && digits.as_bytes().get(1).is_some_and(|&b| (b'3'..=b'9').contains(&b))
}

fn normalize_numbers(text: &str, lang: Language) -> String {
    NUMBER_RE
        .replace_all(text, |caps: &Captures| {
            let m = caps.get(0).unwrap();
            let num = m.as_str();
            let eff = resolve(lang, text, m.start());
            let en = eff == Language::En;

            if let Some(e_pos) = num.find(['e', 'E']) {
                let mantissa = &num[..e_pos];
                let exponent: i64 = num[e_pos + 1..].parse().unwrap_or(0);
                return if en {
                    format!(
                        "{} times ten to the power of {}",
                        number_words(mantissa, eff),
                        int_to_english(exponent)
                    )
                } else {
                    format!(
                        "{}乘以十的{}次方",
                        number_words(mantissa, eff),
                        int_to_chinese(exponent)
                    )
                };
            }

            if num.contains('.') {
                return number_words(num, eff);
            }

            if is_mobile_number(num) {
                return digits_spelled(num, en);
            }

            // A bare four-digit 1000..2999 in English prose reads as a
            // year: "The year 2024" -> "twenty twenty-four".
            if en && num.len() == 4 {
                if let Ok(year) = num.parse::<i64>() {
                    if (1000..=2999).contains(&year) {
                        return year_to_words(year, Language::En);
                    }
                }
            }

            number_words(num, eff)
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chinese_date() {
        assert_eq!(
            normalize("2024年1月16日", Language::Zh),
            "二零二四年一月十六日"
        );
    }

    #[test]
    fn english_date() {
        assert_eq!(
            normalize("2024-01-16", Language::En),
            "January sixteenth, twenty twenty-four"
        );
    }

    #[test]
    fn english_date_ordinal_days() {
        assert_eq!(
            normalize("2024-01-25", Language::En),
            "January twenty-fifth, twenty twenty-four"
        );
        assert_eq!(
            normalize("2024-01-28", Language::En),
            "January twenty-eighth, twenty twenty-four"
        );
        assert_eq!(
            normalize("2024-01-29", Language::En),
            "January twenty-ninth, twenty twenty-four"
        );
    }

    #[test]
    fn english_year_in_prose() {
        let out = normalize("The year 2024 was good.", Language::En);
        assert!(out.contains("twenty twenty-four"), "{out}");
        assert!(!out.contains('2'));
    }

    #[test]
    fn english_year_oh_rule() {
        assert_eq!(normalize("1905年", Language::En), "nineteen oh five");
        assert_eq!(normalize("1900年", Language::En), "nineteen hundred");
        assert_eq!(normalize("2000年", Language::En), "two thousand");
    }

    #[test]
    fn chinese_time() {
        assert_eq!(normalize("14:30", Language::Zh), "十四点三十分");
        assert_eq!(normalize("9:05:30", Language::Zh), "九点五分三十秒");
    }

    #[test]
    fn english_time() {
        assert_eq!(normalize("14:30", Language::En), "two thirty PM");
        assert_eq!(normalize("9:00", Language::En), "nine AM");
    }

    #[test]
    fn currency_symbol_and_suffix() {
        assert_eq!(normalize("¥1,000", Language::Zh), "一千元");
        assert_eq!(normalize("$25.50", Language::En), "twenty-five point five zero dollars");
        assert_eq!(normalize("100元", Language::Zh), "一百元");
        assert_eq!(normalize("3块钱", Language::Zh), "三块钱");
    }

    #[test]
    fn phone_numbers_read_digit_by_digit() {
        assert_eq!(
            normalize("13812345678", Language::Zh),
            "一三八一二三四五六七八"
        );
        let en = normalize("call 13812345678 now", Language::En);
        assert!(en.contains("one three eight one two three four five six seven eight"));
        let after_cjk = normalize("电话13812345678", Language::Zh);
        assert_eq!(after_cjk, "电话一三八一二三四五六七八");
    }

    #[test]
    fn percentages() {
        assert_eq!(normalize("50%", Language::Zh), "百分之五十");
        assert_eq!(normalize("8.5%", Language::En), "eight point five percent");
    }

    #[test]
    fn units_match_longest_first() {
        assert_eq!(normalize("5km", Language::Zh), "五公里");
        assert_eq!(normalize("90km/h", Language::Zh), "九十公里每小时");
        assert_eq!(normalize("100MB", Language::En), "one hundred megabytes");
        assert_eq!(normalize("25°C", Language::Zh), "二十五摄氏度");
    }

    #[test]
    fn math_operators_and_negatives() {
        assert_eq!(normalize("1+2=3", Language::Zh), "一加二等于三");
        assert_eq!(normalize("-5", Language::Zh), "负五");
        let en = normalize("3 - 1 = 2", Language::En);
        assert!(en.contains("minus"), "{en}");
        let neg = normalize("2+-3", Language::Zh);
        assert_eq!(neg, "二加负三");
    }

    #[test]
    fn scientific_notation() {
        assert_eq!(
            normalize("1.5e3", Language::En),
            "one point five times ten to the power of three"
        );
        assert_eq!(
            normalize("2e-2", Language::Zh),
            "二乘以十的负二次方"
        );
    }

    #[test]
    fn auto_detects_language_from_context() {
        let zh = normalize("今天跑了5km很开心", Language::Auto);
        assert!(zh.contains("五公里"), "{zh}");
        let en = normalize("we ran 5km today", Language::Auto);
        assert!(en.contains("five kilometers"), "{en}");
    }

    #[test]
    fn idempotent_on_spelled_text() {
        for text in ["你好世界。", "hello there, friend", "二零二四年一月"] {
            let once = normalize(text, Language::Auto);
            let twice = normalize(&once, Language::Auto);
            assert_eq!(once, twice);
        }
    }
}
