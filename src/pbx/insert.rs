//! Splices record fragments into the project text.

/// Returns `text` with `fragments` written at byte offset `at`, in order.
/// Nothing else in the text changes.
pub fn insert<S: AsRef<str>>(text: &str, at: usize, fragments: &[S]) -> String {
  let added = fragments.iter().map(|x| x.as_ref().len()).sum::<usize>();

  let mut s = String::with_capacity(text.len() + added);
  s.push_str(&text[.. at]);
  for f in fragments {
    s.push_str(f.as_ref());
  }
  s.push_str(&text[at ..]);

  debug_assert_eq!(s.len(), text.len() + added);
  s
}
