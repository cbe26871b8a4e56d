// Padded character n-grams
const PAD_START: char = '^';
const PAD_END: char = '$';

/// Overlapping n-grams of a token, padded with `n - 1` markers on each
/// side so even a one-character token yields at least one n-gram.
pub(crate) fn ngrams(token: &str, n: usize) -> Vec<String> {
    if token.is_empty() || n == 0 {
        return Vec::new();
    }

    let pad = n - 1;
    let chars: Vec<char> = std::iter::repeat(PAD_START)
        .take(pad)
        .chain(token.chars())
        .chain(std::iter::repeat(PAD_END).take(pad))
        .collect();

    chars.windows(n).map(|w| w.iter().collect()).collect()
}
