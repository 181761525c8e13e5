use std::num::NonZeroUsize;

/// Split `text` into pieces of at most `max_chars` characters.
///
/// The unit is the Unicode scalar value, so multi-byte characters are never cut.
/// Every piece but the last holds exactly `max_chars` characters; the last holds
/// the remainder (1..=max_chars). Empty input yields no pieces.
pub fn split_text(text: &str, max_chars: NonZeroUsize) -> Vec<String> {
    let max_chars = max_chars.get();
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut count = 0usize;

    for ch in text.chars() {
        cur.push(ch);
        count += 1;
        if count == max_chars {
            out.push(std::mem::take(&mut cur));
            count = 0;
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: usize) -> NonZeroUsize {
        NonZeroUsize::new(v).unwrap()
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(split_text("", n(1)).is_empty());
        assert!(split_text("", n(4000)).is_empty());
    }

    #[test]
    fn short_input_is_one_chunk() {
        assert_eq!(split_text("hello", n(4000)), vec!["hello"]);
    }

    #[test]
    fn exact_multiple_has_no_trailing_empty_chunk() {
        let chunks = split_text("abcdef", n(3));
        assert_eq!(chunks, vec!["abc", "def"]);

        let text = "x".repeat(8000);
        let chunks = split_text(&text, n(4000));
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() == 4000));
    }

    #[test]
    fn counts_characters_not_bytes() {
        // 'é' is two bytes, '🔥' is four.
        let chunks = split_text("éé🔥🔥é", n(2));
        assert_eq!(chunks, vec!["éé", "🔥🔥", "é"]);
    }

    #[test]
    fn concatenation_round_trips_with_bounded_sizes() {
        let text: String = "Ünïcødé alert 🔥 line\n".repeat(97);
        let total = text.chars().count();

        for size in [1usize, 2, 7, 64, 1000, total, total + 1] {
            let chunks = split_text(&text, n(size));
            assert_eq!(chunks.concat(), text, "size {size}");
            assert_eq!(chunks.len(), total.div_ceil(size), "size {size}");

            let (last, head) = chunks.split_last().unwrap();
            assert!(head.iter().all(|c| c.chars().count() == size));
            let tail = last.chars().count();
            assert!((1..=size).contains(&tail), "size {size}: last has {tail}");
        }
    }

    #[test]
    fn nine_thousand_chars_split_at_four_thousand() {
        let text = "a".repeat(9000);
        let sizes: Vec<usize> = split_text(&text, n(4000))
            .iter()
            .map(|c| c.chars().count())
            .collect();
        assert_eq!(sizes, vec![4000, 4000, 1000]);
    }
}
