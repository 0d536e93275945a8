//! Makefile fragment emitter.
//!
//! Produces, in this order:
//! 1. a header and `?=` defaults for the tool variables
//! 2. the aggregate `all` rule
//! 3. `.SECONDARY`, listing every stub so make keeps them
//! 4. `.3mf` + `.stl` rules per buildable record, in scan order
//! 5. `.png` rules per documentable record, in scan order
//! 6. one `packing.pdf` rule per document group, in discovery order
//!
//! The output is a pure function of its inputs, so identical scans produce
//! byte-identical scripts.

use std::collections::HashMap;
use std::fmt::Write as _;

use scadmake_artifacts::ArtifactLayout;
use scadmake_shared::{
    AppConfig, ArtifactKind, EntryPointRecord, RenderConfig, StubFamily, ToolsConfig,
};

use crate::index::{DocumentGroup, DocumentIndex};

/// Renders the build script for one scan.
#[derive(Debug, Clone)]
pub struct MakefileEmitter {
    layout: ArtifactLayout,
    tools: ToolsConfig,
    render: RenderConfig,
}

/// Inputs to [`MakefileEmitter::render`].
#[derive(Debug, Clone, Copy)]
pub struct BuildGraph<'a> {
    pub buildable: &'a [EntryPointRecord],
    pub documentable: &'a [EntryPointRecord],
    pub groups: &'a DocumentIndex,
}

impl MakefileEmitter {
    pub fn new(layout: ArtifactLayout, tools: ToolsConfig, render: RenderConfig) -> Self {
        Self {
            layout,
            tools,
            render,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            ArtifactLayout::from_config(config),
            config.tools.clone(),
            config.render.clone(),
        )
    }

    /// Render the whole script.
    pub fn render(&self, graph: &BuildGraph<'_>) -> String {
        let mut out = String::new();

        out.push_str("# Generated by scadmake. Do not edit; it is rewritten on every run.\n\n");
        for (var, cmd) in [
            (&self.tools.renderer_var, &self.tools.renderer),
            (&self.tools.colorizer_var, &self.tools.colorizer),
            (&self.tools.assembler_var, &self.tools.assembler),
        ] {
            let _ = writeln!(out, "{var} ?= {cmd}");
        }
        out.push('\n');

        let mut all = self.artifact_targets(graph);
        if !self.tools.aggregate_target.is_empty() {
            all.push(self.tools.aggregate_target.clone());
        }
        push_line(&mut out, "all:", &all);
        out.push('\n');

        push_line(&mut out, ".SECONDARY:", &self.stub_paths(graph));
        out.push('\n');

        for record in graph.buildable {
            let stub = self.stub(record, StubFamily::Export);
            let source = record.source.file_name();
            self.push_rule(
                &mut out,
                &self.artifact(record, ArtifactKind::MultiMaterial),
                &[stub.as_str(), source],
                &self.multi_material_recipe(),
            );
            self.push_rule(
                &mut out,
                &self.artifact(record, ArtifactKind::SingleMaterial),
                &[stub.as_str(), source],
                &self.single_material_recipe(),
            );
        }

        for record in graph.documentable {
            let stub = self.stub(record, StubFamily::Preview);
            self.push_rule(
                &mut out,
                &self.artifact(record, ArtifactKind::Preview),
                &[stub.as_str(), record.source.file_name()],
                &self.preview_recipe(),
            );
        }

        for group in graph.groups.groups() {
            let pages = self.packing_pages(group);
            let deps: Vec<&str> = pages.iter().map(String::as_str).collect();
            self.push_rule(
                &mut out,
                &self.layout.packing_path(&group.basename),
                &deps,
                &self.packing_recipe(),
            );
        }

        out
    }

    /// Every artifact path `all` depends on, in emission order.
    pub fn artifact_targets(&self, graph: &BuildGraph<'_>) -> Vec<String> {
        let mut targets = Vec::new();
        for record in graph.buildable {
            targets.push(self.artifact(record, ArtifactKind::MultiMaterial));
            targets.push(self.artifact(record, ArtifactKind::SingleMaterial));
        }
        for record in graph.documentable {
            targets.push(self.artifact(record, ArtifactKind::Preview));
        }
        for group in graph.groups.groups() {
            targets.push(self.layout.packing_path(&group.basename));
        }
        targets
    }

    /// Every stub path, export stubs first.
    pub fn stub_paths(&self, graph: &BuildGraph<'_>) -> Vec<String> {
        graph
            .buildable
            .iter()
            .map(|r| self.stub(r, StubFamily::Export))
            .chain(
                graph
                    .documentable
                    .iter()
                    .map(|r| self.stub(r, StubFamily::Preview)),
            )
            .collect()
    }

    /// Preview images merged into a group's packing document, in group order.
    ///
    /// These stay individual file names: the assembler sorts them with a
    /// version sort, which a glob would defeat.
    pub fn packing_pages(&self, group: &DocumentGroup) -> Vec<String> {
        group
            .members
            .iter()
            .map(|r| self.artifact(r, ArtifactKind::Preview))
            .collect()
    }

    fn artifact(&self, record: &EntryPointRecord, kind: ArtifactKind) -> String {
        self.layout
            .artifact_path(record.basename(), &record.name, kind)
    }

    fn stub(&self, record: &EntryPointRecord, family: StubFamily) -> String {
        self.layout.stub_path(record.basename(), &record.name, family)
    }

    fn push_rule(&self, out: &mut String, target: &str, deps: &[&str], recipe: &str) {
        let _ = writeln!(out, "{target}: {}", deps.join(" "));
        let _ = writeln!(out, "\t{recipe}");
        out.push('\n');
    }

    // -- recipes ------------------------------------------------------------

    /// Renderer flags shared by every recipe; `-o` and the input are added by
    /// the caller.
    fn renderer_flags(&self, multi_material: bool) -> String {
        let mut flags = format!("-m make -d $@.deps --backend={}", self.render.backend);
        for feature in &self.render.features {
            let _ = write!(flags, " --enable={feature}");
        }
        let _ = write!(
            flags,
            " -D FROM_MAKE=1 -D MAKE_MMU={}",
            u8::from(multi_material)
        );
        flags
    }

    fn multi_material_recipe(&self) -> String {
        let [first, second] = &self.render.colors;
        format!(
            "$({colorizer}) -f -s $({renderer}) -c \"{}\" -c \"{}\" -i $< -o $@ -- {}",
            color_vector(first),
            color_vector(second),
            self.renderer_flags(true),
            colorizer = self.tools.colorizer_var,
            renderer = self.tools.renderer_var,
        )
    }

    fn single_material_recipe(&self) -> String {
        format!(
            "$({}) -o $@ $< {}",
            self.tools.renderer_var,
            self.renderer_flags(false)
        )
    }

    fn preview_recipe(&self) -> String {
        let [width, height] = self.render.preview_size;
        format!(
            "$({}) -o $@ $< {} --imgsize={width},{height} --viewall --autocenter",
            self.tools.renderer_var,
            self.renderer_flags(false)
        )
    }

    fn packing_recipe(&self) -> String {
        format!(
            "$({}) -o $@ $$(printf '%s\\n' $^ | sort -V)",
            self.tools.assembler_var
        )
    }
}

/// `[r,g,b]` with shortest float formatting.
fn color_vector(rgb: &[f64; 3]) -> String {
    format!("[{},{},{}]", rgb[0], rgb[1], rgb[2])
}

/// `head` followed by each item, space-separated.
fn push_line(out: &mut String, head: &str, items: &[String]) {
    out.push_str(head);
    for item in items {
        out.push(' ');
        out.push_str(item);
    }
    out.push('\n');
}

/// Output paths declared by more than one rule, in first-seen order.
///
/// Two rules writing one path would race under `make -j`.
pub fn duplicate_outputs(outputs: &[String]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut dups = Vec::new();
    for path in outputs {
        let count = counts.entry(path.as_str()).or_default();
        *count += 1;
        if *count == 2 {
            dups.push(path.clone());
        }
    }
    dups
}
