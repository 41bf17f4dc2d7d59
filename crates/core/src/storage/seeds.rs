// Default task templates installed by the second migration step

use crate::types::{FieldKind, Template, TemplateField};
use std::collections::BTreeMap;

fn field(name: &str, kind: FieldKind, required: bool) -> TemplateField {
    TemplateField {
        name: name.to_string(),
        kind,
        required,
        default: None,
        options: Vec::new(),
    }
}

fn select(name: &str, options: &[&str], default: Option<&str>) -> TemplateField {
    TemplateField {
        name: name.to_string(),
        kind: FieldKind::Select,
        required: default.is_none(),
        default: default.map(str::to_string),
        options: options.iter().map(|o| o.to_string()).collect(),
    }
}

fn with_default(mut field: TemplateField, value: &str) -> TemplateField {
    field.default = Some(value.to_string());
    field
}

fn samples(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

const PRIORITIES: &[&str] = &["dusuk", "orta", "yuksek"];
const ENVIRONMENTS: &[&str] = &["development", "staging", "production"];

pub(crate) fn default_templates() -> Vec<Template> {
    vec![bug_report(), feature_request(), research(), refactor()]
}

fn bug_report() -> Template {
    Template {
        id: "4dd56a2a-caf4-472c-8c0f-276bc8a1f880".to_string(),
        alias: Some("bug".to_string()),
        name: "Bug Raporu".to_string(),
        description: "Yazılım hatası bildirimi için detaylı template".to_string(),
        title_template: "🐛 [{{module}}] {{title}}".to_string(),
        body_template: "## 🐛 Hata Açıklaması\n{{description}}\n\n\
            ## 📍 Nerede Oluşuyor?\n**Modül/Bileşen:** {{module}}\n**Ortam:** {{environment}}\n\n\
            ## 🔄 Tekrar Üretme Adımları\n{{steps}}\n\n\
            ## ✅ Beklenen Davranış\n{{expected}}\n\n\
            ## ❌ Mevcut Davranış\n{{actual}}\n\n\
            ## 📸 Ek Bilgiler\n{{attachments}}\n\n\
            ## 🔧 Olası Çözüm\n{{solution}}"
            .to_string(),
        fields: vec![
            field("title", FieldKind::Text, true),
            field("description", FieldKind::Text, true),
            field("module", FieldKind::Text, true),
            select("environment", ENVIRONMENTS, None),
            field("steps", FieldKind::Text, true),
            field("expected", FieldKind::Text, true),
            field("actual", FieldKind::Text, true),
            field("attachments", FieldKind::Text, false),
            field("solution", FieldKind::Text, false),
            select("priority", PRIORITIES, Some("orta")),
            with_default(field("tags", FieldKind::Text, false), "bug"),
        ],
        sample_values: samples(&[
            ("title", "Login butonu çalışmıyor"),
            ("module", "auth"),
            ("environment", "production"),
        ]),
        category: "Teknik".to_string(),
        active: true,
    }
}

fn feature_request() -> Template {
    Template {
        id: "2b0d3d8e-3f43-4d0f-9a37-b1a0f4e0c1a5".to_string(),
        alias: Some("feature".to_string()),
        name: "Özellik İsteği".to_string(),
        description: "Yeni özellik veya geliştirme isteği için template".to_string(),
        title_template: "✨ {{title}}".to_string(),
        body_template: "## ✨ Özellik Açıklaması\n{{description}}\n\n\
            ## 🎯 Amaç\n{{purpose}}\n\n\
            ## 👥 Kullanıcılar\n{{users}}\n\n\
            ## 📋 Kabul Kriterleri\n{{criteria}}\n\n\
            ## 🎨 UI/UX Notları\n{{ui_ux}}"
            .to_string(),
        fields: vec![
            field("title", FieldKind::Text, true),
            field("description", FieldKind::Text, true),
            field("purpose", FieldKind::Text, true),
            field("users", FieldKind::Text, false),
            field("criteria", FieldKind::Text, true),
            field("ui_ux", FieldKind::Text, false),
            field("due_date", FieldKind::Date, false),
            select("priority", PRIORITIES, Some("orta")),
            with_default(field("tags", FieldKind::Text, false), "özellik"),
        ],
        sample_values: samples(&[
            ("title", "Karanlık tema desteği"),
            ("purpose", "Gece kullanımında göz yorgunluğunu azaltmak"),
        ]),
        category: "Özellik".to_string(),
        active: true,
    }
}

fn research() -> Template {
    Template {
        id: "8c4a1e7f-5b2d-4e9a-a6f3-0d7c2b9e1f48".to_string(),
        alias: Some("research".to_string()),
        name: "Araştırma Görevi".to_string(),
        description: "Teknoloji veya çözüm araştırması için template".to_string(),
        title_template: "🔍 {{topic}} Araştırması".to_string(),
        body_template: "## 🔍 Araştırma Konusu\n{{topic}}\n\n\
            ## 🎯 Araştırma Amacı\n{{purpose}}\n\n\
            ## ❓ Cevaplanması Gereken Sorular\n{{questions}}\n\n\
            ## ⚖️ Değerlendirme Kriterleri\n{{criteria}}"
            .to_string(),
        fields: vec![
            field("topic", FieldKind::Text, true),
            field("purpose", FieldKind::Text, true),
            field("questions", FieldKind::Text, true),
            field("criteria", FieldKind::Text, false),
            field("due_date", FieldKind::Date, false),
            select("priority", PRIORITIES, Some("orta")),
            with_default(field("tags", FieldKind::Text, false), "araştırma"),
        ],
        sample_values: samples(&[("topic", "Vektör veritabanları")]),
        category: "Araştırma".to_string(),
        active: true,
    }
}

fn refactor() -> Template {
    Template {
        id: "f3e9b6c1-7a42-4d58-9c0e-5b1a8d2f6e37".to_string(),
        alias: Some("refactor".to_string()),
        name: "Refactoring".to_string(),
        description: "Kod kalitesi iyileştirme için template".to_string(),
        title_template: "♻️ {{scope}}: {{title}}".to_string(),
        body_template: "## ♻️ Kapsam\n{{scope}}\n\n\
            ## 🤔 Neden Gerekli?\n{{reason}}\n\n\
            ## 📐 Yaklaşım\n{{approach}}\n\n\
            ## ⚠️ Riskler\n{{risks}}"
            .to_string(),
        fields: vec![
            field("title", FieldKind::Text, true),
            field("scope", FieldKind::Text, true),
            field("reason", FieldKind::Text, true),
            field("approach", FieldKind::Text, false),
            field("risks", FieldKind::Text, false),
            select("priority", PRIORITIES, Some("orta")),
            with_default(field("tags", FieldKind::Text, false), "refactoring"),
        ],
        sample_values: samples(&[("scope", "storage"), ("title", "Sorguları sadeleştir")]),
        category: "Teknik".to_string(),
        active: true,
    }
}
