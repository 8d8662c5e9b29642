use std::collections::{BTreeMap, BTreeSet};

use xf_core::{ValidationMessage, ValidationMessages};
use xf_parser::{parse_xml_document, XmlElementNode, XmlNode};

/// Immutable rule tables for the expected XForm skeleton: which attributes
/// each recognized element may carry and which top-level children `<model>`
/// accepts. Built once and shared by reference across validation calls.
#[derive(Debug, Clone)]
pub struct XFormGrammar {
    recognized_attributes: BTreeMap<&'static str, BTreeSet<&'static str>>,
    model_children: BTreeSet<&'static str>,
}

impl Default for XFormGrammar {
    fn default() -> Self {
        let mut recognized_attributes: BTreeMap<&'static str, BTreeSet<&'static str>> =
            BTreeMap::new();
        recognized_attributes.insert("html", BTreeSet::new());
        recognized_attributes.insert("head", BTreeSet::new());
        recognized_attributes.insert("title", BTreeSet::new());
        recognized_attributes.insert("body", BTreeSet::new());
        recognized_attributes.insert("model", BTreeSet::new());
        recognized_attributes.insert("itext", BTreeSet::new());
        recognized_attributes.insert("translation", BTreeSet::from(["lang", "default"]));
        recognized_attributes.insert("text", BTreeSet::from(["id", "form"]));
        recognized_attributes.insert("value", BTreeSet::from(["form"]));
        recognized_attributes.insert("instance", BTreeSet::from(["id"]));
        recognized_attributes.insert(
            "bind",
            BTreeSet::from([
                "id",
                "nodeset",
                "type",
                "required",
                "relevant",
                "readonly",
                "constraint",
                "calculate",
                "preload",
                "preloadParams",
            ]),
        );

        Self {
            recognized_attributes,
            model_children: BTreeSet::from(["itext", "instance", "bind"]),
        }
    }
}

impl XFormGrammar {
    pub fn is_recognized_attribute(&self, tag: &str, attribute: &str) -> bool {
        self.recognized_attributes
            .get(tag)
            .is_some_and(|recognized| recognized.contains(attribute))
    }

    pub fn is_model_child(&self, tag: &str) -> bool {
        self.model_children.contains(tag)
    }
}

/// Validates one XForm document, collecting every recoverable finding in
/// document order. Only an unparsable input short-circuits, to the single
/// no-root-element error.
pub fn validate_xform(source: &str) -> ValidationMessages {
    validate_xform_with_grammar(source, &XFormGrammar::default())
}

pub fn validate_xform_with_grammar(source: &str, grammar: &XFormGrammar) -> ValidationMessages {
    let document = match parse_xml_document(source) {
        Ok(document) => document,
        Err(_) => {
            let mut messages = ValidationMessages::new();
            messages.push(no_root_element_message());
            return messages;
        }
    };

    let mut walker = Walker {
        grammar,
        messages: ValidationMessages::new(),
        models_seen: 0,
    };

    let root = &document.root;
    let root_path = format!("/{}", root.name);
    walker.walk_element(root, &root_path);
    walker.messages
}

struct Walker<'g> {
    grammar: &'g XFormGrammar,
    messages: ValidationMessages,
    models_seen: usize,
}

struct ItextState {
    seen_languages: BTreeSet<String>,
    default_seen: bool,
    translation_count: usize,
}

impl Walker<'_> {
    // Skeleton dispatch keyed by tag name. Unknown structure never aborts the
    // walk: it degrades to a warning plus transparent descent, so problems
    // nested inside an unrecognized wrapper still surface.
    fn walk_element(&mut self, node: &XmlElementNode, nodeset: &str) {
        match node.name.as_str() {
            "html" | "head" => {
                self.check_attributes(node, nodeset);
                self.walk_children(node, nodeset);
            }
            "body" | "title" => {
                // Presentation and character data; no structural rules below.
                self.check_attributes(node, nodeset);
            }
            "model" => self.validate_model(node, nodeset),
            "itext" => self.validate_itext(node, nodeset),
            _ => {
                self.messages
                    .push(unrecognized_element_message(nodeset, node));
                self.walk_children(node, nodeset);
            }
        }
    }

    fn walk_children(&mut self, node: &XmlElementNode, nodeset: &str) {
        for child in element_children(node) {
            let child_path = format!("{}/{}", nodeset, child.name);
            self.walk_element(child, &child_path);
        }
    }

    fn check_attributes(&mut self, node: &XmlElementNode, nodeset: &str) {
        let unrecognized = node
            .attributes
            .iter()
            .filter(|attribute| {
                !self
                    .grammar
                    .is_recognized_attribute(&node.name, &attribute.name)
            })
            .map(|attribute| attribute.name.as_str())
            .collect::<Vec<_>>();

        if !unrecognized.is_empty() {
            self.messages
                .push(unrecognized_attributes_message(nodeset, node, &unrecognized));
        }
    }

    fn validate_model(&mut self, node: &XmlElementNode, nodeset: &str) {
        if self.models_seen > 0 {
            // Only the second occurrence is reported; every non-first model
            // subtree is excluded from further rules.
            if self.models_seen == 1 {
                self.messages.push(multiple_models_message(nodeset, node));
            }
            self.models_seen += 1;
            return;
        }
        self.models_seen += 1;

        self.check_attributes(node, nodeset);

        for child in &node.children {
            match child {
                XmlNode::Element(element) => match element.name.as_str() {
                    "itext" => {
                        let child_path = format!("{}/itext", nodeset);
                        self.validate_itext(element, &child_path);
                    }
                    name if self.grammar.is_model_child(name) => {
                        // Instance data and bind expressions are not walked;
                        // only their attribute sets are checked.
                        let child_path = format!("{}/{}", nodeset, element.name);
                        self.check_attributes(element, &child_path);
                    }
                    _ => {
                        let child_path = format!("{}/{}", nodeset, element.name);
                        self.messages
                            .push(unrecognized_model_child_message(&child_path, element));
                    }
                },
                XmlNode::Text(text) => {
                    self.messages
                        .push(unrecognized_model_text_message(&text.value));
                }
            }
        }
    }

    fn validate_itext(&mut self, node: &XmlElementNode, nodeset: &str) {
        self.check_attributes(node, nodeset);

        let mut state = ItextState {
            seen_languages: BTreeSet::new(),
            default_seen: false,
            translation_count: 0,
        };
        self.walk_itext_children(node, nodeset, &mut state);

        if state.translation_count == 0 {
            self.messages.push(no_translations_message(nodeset, node));
        }
    }

    fn walk_itext_children(&mut self, node: &XmlElementNode, nodeset: &str, state: &mut ItextState) {
        for child in element_children(node) {
            if child.name == "translation" {
                state.translation_count += 1;
                let child_path = format!("{}/translation", nodeset);
                self.validate_translation(child, &child_path, state);
            } else {
                let child_path = format!("{}/{}", nodeset, child.name);
                self.messages
                    .push(unrecognized_element_message(&child_path, child));
                self.walk_itext_children(child, &child_path, state);
            }
        }
    }

    fn validate_translation(&mut self, node: &XmlElementNode, nodeset: &str, state: &mut ItextState) {
        self.check_attributes(node, nodeset);

        let lang = node.attribute("lang");
        match lang {
            None => {
                self.messages
                    .push(translation_without_language_message(nodeset, node));
            }
            Some(lang) => {
                if !state.seen_languages.insert(lang.to_string()) {
                    self.messages
                        .push(duplicate_translation_message(nodeset, node, lang));
                }
            }
        }

        let is_default = node.attribute("default") == Some("true");
        if is_default {
            if state.default_seen {
                self.messages
                    .push(duplicate_default_translation_message(nodeset, node));
            }
            state.default_seen = true;
        }

        // Text-level findings locate through the predicated translation
        // segment shared by this translation's whole subtree.
        let predicated = format!(
            "{}[@lang={}][@default={}]",
            nodeset,
            lang.unwrap_or("null"),
            is_default
        );
        let mut seen_texts: BTreeSet<(String, Option<String>)> = BTreeSet::new();
        self.walk_translation_texts(node, &predicated, &mut seen_texts);
    }

    fn walk_translation_texts(
        &mut self,
        node: &XmlElementNode,
        base: &str,
        seen_texts: &mut BTreeSet<(String, Option<String>)>,
    ) {
        for child in element_children(node) {
            if child.name == "text" {
                self.validate_text(child, base, seen_texts);
            } else {
                let child_path = format!("{}/{}", base, child.name);
                self.messages
                    .push(unrecognized_element_message(&child_path, child));
                self.walk_translation_texts(child, &child_path, seen_texts);
            }
        }
    }

    fn validate_text(
        &mut self,
        node: &XmlElementNode,
        base: &str,
        seen_texts: &mut BTreeSet<(String, Option<String>)>,
    ) {
        let text_path = format!("{}/text", base);

        let Some(id) = node.attribute("id") else {
            // No id to anchor value paths on; the subtree is skipped.
            self.messages.push(text_without_id_message(&text_path, node));
            return;
        };

        let form = node.attribute("form").map(str::to_string);
        if !seen_texts.insert((id.to_string(), form.clone())) {
            self.messages.push(duplicate_text_definition_message(
                &text_path,
                node,
                id,
                form.as_deref(),
            ));
            return;
        }

        self.check_attributes(node, &text_path);

        for child in element_children(node) {
            if child.name == "value" {
                let value_path = format!("{}/text[@id={}]/value", base, id);
                self.check_attributes(child, &value_path);
            } else {
                self.messages.push(unrecognized_text_child_message(child));
            }
        }
    }
}

fn element_children(node: &XmlElementNode) -> impl Iterator<Item = &XmlElementNode> {
    node.children.iter().filter_map(|entry| match entry {
        XmlNode::Element(element) => Some(element),
        _ => None,
    })
}

// Message templates. The rendered text is the external contract: consumers
// match on exact text, so whitespace, indentation, and trailing newlines are
// load-bearing.

fn serialize_open_tag(node: &XmlElementNode) -> String {
    let mut rendered = format!("<{}", node.name);
    for attribute in &node.attributes {
        rendered.push_str(&format!(" {}=\"{}\"", attribute.name, attribute.value));
    }
    rendered.push('>');
    rendered
}

fn location_footer(nodeset: &str, node: &XmlElementNode) -> String {
    format!(
        "\n    Problem found at nodeset: {}\n    With element {}\n",
        nodeset,
        serialize_open_tag(node)
    )
}

fn no_root_element_message() -> ValidationMessage {
    ValidationMessage::error("Document has no root element!")
}

fn unrecognized_element_message(nodeset: &str, node: &XmlElementNode) -> ValidationMessage {
    ValidationMessage::warning(format!(
        "Unrecognized element [{}]. Ignoring and processing children...{}",
        node.name,
        location_footer(nodeset, node)
    ))
}

fn unrecognized_attributes_message(
    nodeset: &str,
    node: &XmlElementNode,
    names: &[&str],
) -> ValidationMessage {
    ValidationMessage::warning(format!(
        "Warning: {} Unrecognized attributes found in Element [{}] and will be ignored: [{}] Location:\n{}",
        names.len(),
        node.name,
        names.join(", "),
        location_footer(nodeset, node)
    ))
}

fn multiple_models_message(nodeset: &str, node: &XmlElementNode) -> ValidationMessage {
    ValidationMessage::error(format!(
        "Multiple models not supported. Ignoring subsequent models.{}",
        location_footer(nodeset, node)
    ))
}

fn unrecognized_model_child_message(nodeset: &str, node: &XmlElementNode) -> ValidationMessage {
    ValidationMessage::error(format!(
        "Unrecognized top-level tag [{}] found within <model>{}",
        node.name,
        location_footer(nodeset, node)
    ))
}

fn unrecognized_model_text_message(text: &str) -> ValidationMessage {
    ValidationMessage::error(format!(
        "Unrecognized text content found within <model>: \"{}\"",
        text.trim()
    ))
}

fn no_translations_message(nodeset: &str, node: &XmlElementNode) -> ValidationMessage {
    ValidationMessage::error(format!(
        "no <translation>s defined{}",
        location_footer(nodeset, node)
    ))
}

fn translation_without_language_message(nodeset: &str, node: &XmlElementNode) -> ValidationMessage {
    ValidationMessage::error(format!(
        "no language specified for <translation>{}",
        location_footer(nodeset, node)
    ))
}

fn duplicate_translation_message(
    nodeset: &str,
    node: &XmlElementNode,
    lang: &str,
) -> ValidationMessage {
    ValidationMessage::error(format!(
        "duplicate <translation> for language '{}'{}",
        lang,
        location_footer(nodeset, node)
    ))
}

fn duplicate_default_translation_message(nodeset: &str, node: &XmlElementNode) -> ValidationMessage {
    ValidationMessage::error(format!(
        "more than one <translation> set as default{}",
        location_footer(nodeset, node)
    ))
}

fn text_without_id_message(nodeset: &str, node: &XmlElementNode) -> ValidationMessage {
    ValidationMessage::error(format!(
        "no id defined for <text>{}",
        location_footer(nodeset, node)
    ))
}

fn unrecognized_text_child_message(node: &XmlElementNode) -> ValidationMessage {
    ValidationMessage::error(format!(
        "Unrecognized element [{}] in Itext->translation->text",
        node.name
    ))
}

fn duplicate_text_definition_message(
    nodeset: &str,
    node: &XmlElementNode,
    id: &str,
    form: Option<&str>,
) -> ValidationMessage {
    ValidationMessage::error(format!(
        "duplicate definition for text ID \"{}\" and form \"{}\". Can only have one definition for each text form.{}",
        id,
        form.unwrap_or("null"),
        location_footer(nodeset, node)
    ))
}
