use super::placeholder::ident_len;

const START_OPEN: &str = "{@START_";
const END_OPEN: &str = "{@END_";
const TAG_CLOSE: &str = "@}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    /// A `{@START_<id>@}...{@END_<id>@}` block. `body` is opaque template text.
    Section { id: &'a str, body: &'a str },
}

struct SectionMatch<'a> {
    id: &'a str,
    body: &'a str,
    end: usize,
}

/// Split a decoded template into literal and section segments, in document order.
///
/// A block closes at the first END tag carrying the same id. A START tag with no
/// matching END stays literal, and scanning resumes one byte after its `{`.
pub fn scan_sections(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = template[cursor..].find(START_OPEN) {
        let tag_start = cursor + offset;
        match match_section(template, tag_start) {
            Some(section) => {
                if literal_start < tag_start {
                    segments.push(Segment::Literal(&template[literal_start..tag_start]));
                }
                segments.push(Segment::Section {
                    id: section.id,
                    body: section.body,
                });
                cursor = section.end;
                literal_start = section.end;
            }
            None => cursor = tag_start + 1,
        }
    }

    if literal_start < template.len() {
        segments.push(Segment::Literal(&template[literal_start..]));
    }

    segments
}

fn match_section(template: &str, tag_start: usize) -> Option<SectionMatch<'_>> {
    let id_start = tag_start + START_OPEN.len();
    let id_len = ident_len(&template[id_start..]);
    if id_len == 0 {
        return None;
    }

    let id_end = id_start + id_len;
    if !template[id_end..].starts_with(TAG_CLOSE) {
        return None;
    }

    let id = &template[id_start..id_end];
    let body_start = id_end + TAG_CLOSE.len();
    let end_tag = format!("{END_OPEN}{id}{TAG_CLOSE}");
    let body_len = template[body_start..].find(&end_tag)?;
    let body_end = body_start + body_len;

    Some(SectionMatch {
        id,
        body: &template[body_start..body_end],
        end: body_end + end_tag.len(),
    })
}
