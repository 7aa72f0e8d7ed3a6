//! The content tree: structural units of the course document with
//! resolved imports and inherited attributes.
//!
//! Nodes live in an arena owned by [`Tree`]; the parent link is a plain
//! [`NodeId`] used only for attribute lookup during construction. A node's
//! effective attribute mapping is fixed once it is built: the parent's
//! effective mapping, overridden by the node's own XML attributes, then by
//! its absorbed leaf-text children.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::context::BuildContext;
use crate::document::{Element, XmlNode};
use crate::error::BuildError;
use crate::import;
use crate::notation::LangString;

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// One structural element of the course document.
#[derive(Debug)]
pub struct ContentNode {
    pub tag: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Default notation, from the nearest ancestor `lang` attribute.
    pub lang: Option<String>,
    /// Direct text content, comments excluded.
    pub text: String,
    /// Buildable-unit data when the tag names a registered unit type.
    pub unit: Option<Unit>,
    attrs: BTreeMap<String, LangString>,
}

impl ContentNode {
    /// Effective attribute mapping (inherited + local, local wins).
    pub fn attrs(&self) -> &BTreeMap<String, LangString> {
        &self.attrs
    }
}

/// Identity and cache state of a buildable unit.
#[derive(Debug)]
pub struct Unit {
    pub name: String,
    pub type_name: String,
    /// True once a prior-run fingerprint comparison proved the unit's
    /// attributes unchanged.
    pub remains_unchanged: bool,
}

#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<ContentNode>,
}

impl Tree {
    /// Build the whole tree from a parsed root element, resolving imports
    /// and registering buildable units into the context's worklist.
    pub fn build(root: Element, ctx: &mut BuildContext<'_>) -> Result<Tree, BuildError> {
        let mut tree = Tree::default();
        tree.build_node(root, None, ctx)?;
        Ok(tree)
    }

    pub fn node(&self, id: NodeId) -> &ContentNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut ContentNode {
        &mut self.nodes[id.0]
    }

    pub fn view(&self, id: NodeId) -> NodeView<'_> {
        NodeView { tree: self, id }
    }

    fn build_node(
        &mut self,
        mut element: Element,
        parent: Option<NodeId>,
        ctx: &mut BuildContext<'_>,
    ) -> Result<NodeId, BuildError> {
        import::resolve_imports(&mut element, ctx.config)?;

        let lang = element
            .attr("lang")
            .map(str::to_string)
            .or_else(|| parent.and_then(|p| self.nodes[p.0].lang.clone()));

        // Effective mapping: inherited, then XML attributes, then absorbed
        // leaf-text children.
        let mut attrs = parent
            .map(|p| self.nodes[p.0].attrs.clone())
            .unwrap_or_default();
        for (k, v) in &element.attrs {
            attrs.insert(k.clone(), LangString::new(v.clone(), lang.clone()));
        }
        for child in element.child_elements() {
            if child.is_leaf_text() && !ctx.registry.is_unit_type(&child.tag) {
                attrs.insert(
                    child.tag.clone(),
                    LangString::new(child.direct_text(), lang.clone()),
                );
            }
        }

        let tag = element.tag.clone();
        let text = element.direct_text();
        // Explicit `name` attribute or one inherited from an ancestor;
        // synthesized names are not visible to children.
        let given_name = attrs.get("name").map(|v| v.value.clone());

        let id = NodeId(self.nodes.len());
        self.nodes.push(ContentNode {
            tag: tag.clone(),
            parent,
            children: Vec::new(),
            lang: lang.clone(),
            text: text.clone(),
            unit: None,
            attrs,
        });

        let mut child_ids = Vec::new();
        for child in element.children {
            if let XmlNode::Element(child) = child {
                if !child.is_leaf_text() || ctx.registry.is_unit_type(&child.tag) {
                    child_ids.push(self.build_node(child, Some(id), ctx)?);
                }
            }
        }
        self.nodes[id.0].children = child_ids;

        if ctx.registry.is_unit_type(&tag) {
            let ordinal = ctx.next_ordinal(&tag);
            let name = given_name.unwrap_or_else(|| format!("{tag}{ordinal}"));
            let node = &mut self.nodes[id.0];
            node.attrs
                .insert("type".to_string(), LangString::plain(tag.clone()));
            node.attrs
                .insert("name".to_string(), LangString::plain(name.clone()));
            node.attrs
                .insert("Content".to_string(), LangString::new(text, lang));
            node.unit = Some(Unit {
                name,
                type_name: tag.clone(),
                remains_unchanged: false,
            });
            if ctx.registry.recipe(&tag).is_some() {
                ctx.register(id);
            }
        }

        Ok(id)
    }
}

/// Borrowed, copyable view of one node, handed to recipes.
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl<'a> NodeView<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn node(&self) -> &'a ContentNode {
        self.tree.node(self.id)
    }

    pub fn tag(&self) -> &'a str {
        &self.node().tag
    }

    pub fn attrs(&self) -> &'a BTreeMap<String, LangString> {
        self.node().attrs()
    }

    pub fn attr(&self, name: &str) -> Option<&'a LangString> {
        self.node().attrs().get(name)
    }

    /// The unit's joined text content, as materialized at construction.
    pub fn content(&self) -> Option<&'a LangString> {
        self.attr("Content")
    }

    pub fn name(&self) -> &'a str {
        self.node()
            .unit
            .as_ref()
            .map(|u| u.name.as_str())
            .unwrap_or(&self.node().tag)
    }

    pub fn type_name(&self) -> &'a str {
        self.node()
            .unit
            .as_ref()
            .map(|u| u.type_name.as_str())
            .unwrap_or(&self.node().tag)
    }

    pub fn remains_unchanged(&self) -> bool {
        self.node()
            .unit
            .as_ref()
            .map(|u| u.remains_unchanged)
            .unwrap_or(false)
    }

    pub fn children(&self) -> impl Iterator<Item = NodeView<'a>> + 'a {
        let tree = self.tree;
        self.node()
            .children
            .iter()
            .map(move |&id| NodeView { tree, id })
    }

    /// Child nodes carrying the given tag, in document order.
    pub fn children_with_tag(&self, tag: &str) -> Vec<NodeView<'a>> {
        self.children().filter(|c| c.tag() == tag).collect()
    }

    /// String form of the attribute mapping, for path-scheme expansion and
    /// fingerprinting contexts that only need values.
    pub fn string_vars(&self) -> BTreeMap<String, String> {
        self.attrs()
            .iter()
            .map(|(k, v)| (k.clone(), v.value.clone()))
            .collect()
    }

    /// Files spliced into this node by import resolution, relative to the
    /// config base directory.
    pub fn imported_files(&self) -> Vec<PathBuf> {
        self.attr("imported")
            .map(|v| {
                import::split_quoted_commas(&v.value)
                    .into_iter()
                    .map(PathBuf::from)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Directories containing the imported files, deduplicated in order,
    /// relative to the config base directory.
    pub fn imported_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for file in self.imported_files() {
            if let Some(parent) = file.parent() {
                if !dirs.iter().any(|d| d == parent) {
                    dirs.push(parent.to_path_buf());
                }
            }
        }
        dirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::document::parse_str;
    use crate::recipe::{BuildOptions, Recipe, RecipeRegistry, Stage};
    use std::path::Path;

    struct Noop;
    impl Recipe for Noop {
        fn build(
            &self,
            _unit: NodeView<'_>,
            _stage: &Stage<'_>,
            _opts: &BuildOptions,
        ) -> Result<(), BuildError> {
            Ok(())
        }
        fn output_files(&self, _unit: NodeView<'_>, _opts: &BuildOptions) -> Vec<String> {
            Vec::new()
        }
    }

    fn registry() -> RecipeRegistry {
        let mut registry = RecipeRegistry::new();
        registry.register("TP", Box::new(Noop));
        registry.register("CM", Box::new(Noop));
        registry.register_fragment("Exercice");
        registry
    }

    fn build(xml: &str) -> (Tree, Vec<NodeId>) {
        let config = Config::default();
        let registry = registry();
        let mut ctx = BuildContext::new(&config, &registry);
        let root = parse_str(xml, Path::new("course.xml")).unwrap();
        let tree = Tree::build(root, &mut ctx).unwrap();
        let worklist = ctx.into_worklist();
        (tree, worklist)
    }

    #[test]
    fn attributes_are_inherited_and_locally_overridden() {
        let (tree, worklist) = build(
            r#"<Course year="2025" room="A1">
                 <TP name="w1" room="B2"><Exercice>count</Exercice></TP>
               </Course>"#,
        );
        let tp = tree.view(worklist[0]);
        assert_eq!(tp.attr("year").unwrap().value, "2025");
        assert_eq!(tp.attr("room").unwrap().value, "B2");

        let exercice = tp.children_with_tag("Exercice")[0];
        assert_eq!(exercice.attr("year").unwrap().value, "2025");
        assert_eq!(exercice.attr("room").unwrap().value, "B2");
    }

    #[test]
    fn leaf_text_children_become_attributes() {
        let (tree, worklist) = build(
            r#"<Course><TP name="w1"><title>Pointers</title><Exercice>e</Exercice></TP></Course>"#,
        );
        let tp = tree.view(worklist[0]);
        assert_eq!(tp.attr("title").unwrap().value, "Pointers");
        // the absorbed child is not a node
        assert!(tp.children_with_tag("title").is_empty());
        // but the registered fragment type stays a node even as leaf text
        assert_eq!(tp.children_with_tag("Exercice").len(), 1);
    }

    #[test]
    fn names_are_synthesized_per_type() {
        let (tree, worklist) = build("<Course><TP/><CM/><TP name='w'/><TP/></Course>");
        let names: Vec<&str> = worklist.iter().map(|&id| tree.view(id).name()).collect();
        // the ordinal ticks for named units too
        assert_eq!(names, vec!["TP1", "CM1", "w", "TP3"]);
    }

    #[test]
    fn fragments_are_not_on_the_worklist() {
        let (tree, worklist) = build(
            r#"<Course><TP name="w1"><Exercice>a</Exercice><Exercice>b</Exercice></TP></Course>"#,
        );
        assert_eq!(worklist.len(), 1);
        assert_eq!(tree.view(worklist[0]).name(), "w1");
    }

    #[test]
    fn content_holds_direct_text_only() {
        let (tree, worklist) = build(
            "<Course><TP name='w1'>intro<!-- note --><Exercice>inner</Exercice>outro</TP></Course>",
        );
        let tp = tree.view(worklist[0]);
        assert_eq!(tp.content().unwrap().value, "intro\noutro");
    }

    #[test]
    fn lang_is_inherited_into_content() {
        let (tree, worklist) = build(
            r#"<Course lang="latex"><TP name="w1">x</TP><CM name="c" lang="markdown">y</CM></Course>"#,
        );
        let tp = tree.view(worklist[0]);
        assert_eq!(tp.content().unwrap().notation.as_deref(), Some("latex"));
        let cm = tree.view(worklist[1]);
        assert_eq!(cm.content().unwrap().notation.as_deref(), Some("markdown"));
    }

    #[test]
    fn type_attribute_is_materialized() {
        let (tree, worklist) = build("<Course><TP name='w1'/></Course>");
        let tp = tree.view(worklist[0]);
        assert_eq!(tp.attr("type").unwrap().value, "TP");
        assert_eq!(tp.attr("name").unwrap().value, "w1");
    }
}
