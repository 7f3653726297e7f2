use crate::{
    BuildError,
    config::GeneratorConfig,
    generate_tokens,
    profile::{CapabilityError, Feature, PROFILE_CHAIN, Profile},
};
use keyspace_schema::decl::*;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use syn::{ImplItem, Item, ReturnType, Type};

//
// helpers
//

fn config(profile: Profile) -> GeneratorConfig {
    GeneratorConfig {
        profile,
        ..GeneratorConfig::default()
    }
}

fn try_generate(decl: &SchemaDecl, profile: Profile) -> Result<syn::File, BuildError> {
    let tokens = generate_tokens(decl, &config(profile))?;

    Ok(syn::parse2(tokens).expect("generated code parses"))
}

fn generate(decl: &SchemaDecl, profile: Profile) -> Api {
    Api::new(&try_generate(decl, profile).expect("schema generates"))
}

fn type_name(ty: &Type) -> String {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default(),
        other => quote::quote!(#other).to_string(),
    }
}

///
/// Api
/// Inherent methods of every generated type, with the name of the type
/// each one returns.
///

struct Api {
    types: BTreeSet<String>,
    consts: BTreeSet<String>,
    methods: BTreeMap<String, BTreeMap<String, String>>,
}

impl Api {
    fn new(file: &syn::File) -> Self {
        let mut types = BTreeSet::new();
        let mut consts = BTreeSet::new();
        let mut methods = BTreeMap::<String, BTreeMap<String, String>>::new();

        for item in &file.items {
            match item {
                Item::Struct(item) => {
                    types.insert(item.ident.to_string());
                }
                Item::Const(item) => {
                    consts.insert(item.ident.to_string());
                }
                Item::Impl(item) if item.trait_.is_none() => {
                    let owner = methods.entry(type_name(&item.self_ty)).or_default();
                    for inner in &item.items {
                        if let ImplItem::Fn(function) = inner {
                            let output = match &function.sig.output {
                                ReturnType::Default => "()".to_string(),
                                ReturnType::Type(_, ty) => type_name(ty),
                            };
                            owner.insert(function.sig.ident.to_string(), output);
                        }
                    }
                }
                _ => {}
            }
        }

        Self {
            types,
            consts,
            methods,
        }
    }

    fn has_type(&self, name: &str) -> bool {
        self.types.contains(name)
    }

    fn has(&self, owner: &str, method: &str) -> bool {
        self.methods
            .get(owner)
            .is_some_and(|methods| methods.contains_key(method))
    }

    fn returns(&self, owner: &str, method: &str) -> &str {
        self.methods
            .get(owner)
            .and_then(|methods| methods.get(method))
            .unwrap_or_else(|| panic!("{owner}::{method} is not generated"))
    }
}

fn user() -> EntityDecl {
    EntityDecl::new("User")
        .field(FieldDecl::new("id", "bigint").partition(0))
        .field(FieldDecl::new("clust1", "int").clustering(0, true))
        .field(FieldDecl::new("clust2", "int").clustering(1, true))
        .field(FieldDecl::new("name", "text"))
}

fn users() -> SchemaDecl {
    SchemaDecl::new().entity(user())
}

fn unavailable(err: BuildError) -> (Feature, Profile) {
    match err {
        BuildError::Capability(CapabilityError::FeatureUnavailable {
            feature, minimum, ..
        }) => (feature, minimum),
        other => panic!("expected a capability error, got {other}"),
    }
}

//
// select
//

#[test]
fn select_chain_follows_key_order() {
    let api = generate(&users(), Profile::Cassandra30);

    assert_eq!(api.returns("UserManager", "select"), "UserSelectWhereId");
    assert_eq!(api.returns("UserSelectWhereId", "id"), "UserSelectWhereClust1");
    assert!(api.has("UserSelectWhereId", "id_in"));
    assert!(!api.has("UserSelectWhereId", "clust1_eq"));
    assert!(!api.has("UserSelectWhereId", "clust2_eq"));

    assert_eq!(
        api.returns("UserSelectWhereClust1", "clust1_eq"),
        "UserSelectWhereClust2"
    );
    assert!(!api.has("UserSelectWhereClust1", "clust2_eq"));
    assert_eq!(
        api.returns("UserSelectWhereClust2", "clust2_eq"),
        "UserSelectEnd"
    );
}

#[test]
fn text_then_descending_clustering_keeps_key_order() {
    let decl = SchemaDecl::new().entity(
        EntityDecl::new("Reading")
            .field(FieldDecl::new("id", "bigint").partition(0))
            .field(FieldDecl::new("clust1", "text").clustering(0, true))
            .field(FieldDecl::new("clust2", "int").clustering(1, false))
            .field(FieldDecl::new("value", "text")),
    );
    let api = generate(&decl, Profile::Cassandra30);

    assert_eq!(api.returns("ReadingManager", "select"), "ReadingSelectWhereId");
    assert_eq!(api.returns("ReadingSelectWhereId", "id"), "ReadingSelectWhereClust1");
    assert!(!api.has("ReadingSelectWhereId", "clust1_eq"));

    for method in ["clust1_eq", "clust1_gt", "clust1_gte_and_lt"] {
        assert!(api.has("ReadingSelectWhereClust1", method), "{method}");
    }
    assert_eq!(
        api.returns("ReadingSelectWhereClust1", "clust1_eq"),
        "ReadingSelectWhereClust2"
    );
    let before = api.methods.get("ReadingSelectWhereClust1").expect("state");
    assert!(before.keys().all(|method| !method.starts_with("clust2")));

    assert_eq!(
        api.returns("ReadingSelectWhereClust2", "clust2_eq"),
        "ReadingSelectEnd"
    );
    assert_eq!(
        api.returns("ReadingSelectWhereClust2", "clust2_gt_and_lt"),
        "ReadingSelectEnd"
    );
    assert!(api.has("ReadingSelectEnd", "with_natural_order"));
}

#[test]
fn every_clustering_state_offers_all_slice_shapes() {
    let api = generate(&users(), Profile::Cassandra30);

    for (state, column) in [("UserSelectWhereClust1", "clust1"), ("UserSelectWhereClust2", "clust2")] {
        for suffix in [
            "gt",
            "gte",
            "lt",
            "lte",
            "gt_and_lt",
            "gt_and_lte",
            "gte_and_lt",
            "gte_and_lte",
        ] {
            let method = format!("{column}_{suffix}");
            assert_eq!(api.returns(state, &method), "UserSelectEnd", "{state}::{method}");
        }

        // a partial key may already terminate
        assert!(api.has(state, "get_list"));
        assert!(api.has(state, "with_reversed_order"));
    }

    assert!(api.has("UserSelectEnd", "get_one"));
    assert!(api.has("UserSelectEnd", "get_list_async"));
    assert!(api.has("UserSelectEnd", "with_paging_state"));
}

#[test]
fn per_partition_limit_follows_profile() {
    let old = generate(&users(), Profile::Cassandra30);
    let new = generate(&users(), Profile::Cassandra36);

    assert!(!old.has("UserSelectEnd", "per_partition_limit"));
    assert!(new.has("UserSelectEnd", "per_partition_limit"));
}

#[test]
fn json_families_need_json_statements() {
    let old = generate(&users(), Profile::Cassandra21);
    assert!(!old.has_type("UserSelectJsonWhereId"));
    assert!(!old.has("UserManager", "select_json"));
    assert!(!old.has("UserManager", "insert_json"));
    assert!(!old.has("UserSelectWhereId", "id_from_json"));

    let api = generate(&users(), Profile::Cassandra22);
    assert_eq!(api.returns("UserManager", "select_json"), "UserSelectJsonWhereId");
    assert!(api.has("UserSelectJsonEnd", "get_json_list"));
    assert!(!api.has("UserSelectJsonEnd", "get_list"));
    assert!(api.has("UserSelectWhereId", "id_from_json"));
}

//
// writes
//

#[test]
fn update_assigns_before_keys() {
    let api = generate(&users(), Profile::Cassandra30);

    assert_eq!(api.returns("UserUpdateSet", "name_set"), "UserUpdateSetOrWhere");
    assert!(!api.has("UserUpdateSet", "id"));
    assert_eq!(api.returns("UserUpdateSetOrWhere", "name_set_null"), "Self");
    assert_eq!(api.returns("UserUpdateSetOrWhere", "id"), "UserUpdateWhereClust1");
    assert_eq!(api.returns("UserUpdateWhereClust1", "clust1"), "UserUpdateWhereClust2");
    assert_eq!(api.returns("UserUpdateWhereClust2", "clust2"), "UserUpdateEnd");

    // the full key is mandatory
    assert!(!api.has("UserUpdateWhereClust1", "execute"));
    assert!(api.has("UserUpdateEnd", "using_ttl"));
}

#[test]
fn if_exists_and_conditions_exclude_each_other() {
    let api = generate(&users(), Profile::Cassandra30);

    for family in ["UserUpdate", "UserDelete"] {
        let end = format!("{family}End");
        let exists = format!("{family}IfExists");
        let conditional = format!("{family}If");

        assert_eq!(api.returns(&end, "if_exists"), exists);
        assert_eq!(api.returns(&end, "if_name_eq"), conditional);
        assert_eq!(api.returns(&conditional, "if_name_eq"), "Self");

        assert!(!api.has(&exists, "if_name_eq"));
        assert!(!api.has(&conditional, "if_exists"));
        for state in [&exists, &conditional] {
            assert!(api.has(state, "execute"));
            assert!(api.has(state, "with_consistency"));
            assert!(api.has(state, "using_timestamp"));
        }
    }

    // a whole-partition delete may go straight to IF EXISTS
    assert_eq!(
        api.returns("UserDeleteWhereClust1", "if_exists"),
        "UserDeleteIfExists"
    );
}

#[test]
fn collection_setters_follow_the_shape() {
    let decl = SchemaDecl::new().entity(
        user()
            .field(FieldDecl::new("tags", "set<text>"))
            .field(FieldDecl::new("scores", "list<int>"))
            .field(FieldDecl::new("attrs", "map<text, text>"))
            .field(FieldDecl::new("frozen_tags", "frozen<set<text>>")),
    );
    let api = generate(&decl, Profile::Cassandra30);
    let state = "UserUpdateSetOrWhere";

    assert!(api.has(state, "tags_add_to"));
    assert!(api.has(state, "tags_remove_from"));
    assert!(api.has(state, "scores_append_to"));
    assert!(api.has(state, "scores_prepend_to"));
    assert!(api.has(state, "scores_set_at_index"));
    assert!(api.has(state, "attrs_put_to"));
    assert!(api.has(state, "attrs_remove_by_key"));

    assert!(api.has(state, "frozen_tags_set"));
    assert!(!api.has(state, "frozen_tags_add_to"));
}

#[test]
fn delete_prefixes_need_range_deletes() {
    let old = generate(&users(), Profile::Cassandra22);
    // whole partition
    assert!(old.has("UserDeleteWhereClust1", "execute"));
    // partial clustering prefix
    assert!(!old.has("UserDeleteWhereClust2", "execute"));
    assert!(!old.has("UserDeleteWhereClust2", "clust2_gt"));
    assert!(old.has("UserDeleteEnd", "execute"));

    let new = generate(&users(), Profile::Cassandra30);
    assert!(new.has("UserDeleteWhereClust2", "execute"));
    assert_eq!(new.returns("UserDeleteWhereClust2", "clust2_gt"), "UserDeleteEnd");
    assert!(!new.has("UserDeleteEnd", "using_ttl"));
    assert!(new.has("UserDeleteEnd", "using_timestamp"));
}

#[test]
fn counter_tables_have_no_insert() {
    let decl = SchemaDecl::new().entity(
        EntityDecl::new("PageHits")
            .field(FieldDecl::new("page", "text").partition(0))
            .field(FieldDecl::new("hits", "counter")),
    );
    let api = generate(&decl, Profile::Cassandra30);

    assert!(!api.has_type("PageHitsInsert"));
    assert!(!api.has("PageHitsManager", "insert"));
    assert!(api.has("PageHitsUpdateSet", "hits_incr"));
    assert!(api.has("PageHitsUpdateSet", "hits_decr"));
    assert!(!api.has("PageHitsUpdateSet", "hits_set"));
    assert!(!api.has("PageHitsUpdateEnd", "using_ttl"));
    assert!(!api.has("PageHitsUpdateEnd", "if_hits_eq"));
}

#[test]
fn static_families_cover_the_partition_only() {
    let decl = SchemaDecl::new().entity(
        user().field(FieldDecl::new("owner", "text").static_column()),
    );
    let api = generate(&decl, Profile::Cassandra30);

    assert_eq!(
        api.returns("UserManager", "update_static"),
        "UserUpdateStaticSet"
    );
    assert_eq!(
        api.returns("UserUpdateStaticSetOrWhere", "id"),
        "UserUpdateStaticEnd"
    );
    assert!(!api.has("UserUpdateStaticSet", "name_set"));
    assert_eq!(
        api.returns("UserManager", "delete_static"),
        "UserDeleteStaticWhereId"
    );
    assert_eq!(api.returns("UserDeleteStaticWhereId", "id"), "UserDeleteStaticEnd");
}

//
// indexes
//

#[test]
fn index_operators_follow_the_implementation() {
    let decl = SchemaDecl::new().entity(
        user()
            .field(
                FieldDecl::new("email", "text")
                    .index(IndexDecl::sasi(SasiDecl::mode(SasiMode::Contains))),
            )
            .field(FieldDecl::new("tags", "set<text>").index(IndexDecl::native()))
            .field(
                FieldDecl::new("attrs", "map<text, int>")
                    .index(IndexDecl::native().kind(IndexKindDecl::MapEntry)),
            ),
    );
    let api = generate(&decl, Profile::Cassandra37);

    assert_eq!(api.returns("UserManager", "index_select"), "UserIndexSelect");
    for method in [
        "email_eq",
        "email_starts_with",
        "email_ends_with",
        "email_contains_text",
        "email_like",
        "tags_contains",
        "attrs_contains_entry",
    ] {
        assert_eq!(api.returns("UserIndexSelect", method), "UserIndexSelectEnd");
        assert_eq!(api.returns("UserIndexSelectEnd", method), "Self");
    }

    assert!(!api.has("UserIndexSelect", "name_eq"));
    assert!(api.has("UserIndexSelectEnd", "allow_filtering"));
    assert!(!api.has("UserIndexSelectEnd", "with_reversed_order"));
}

#[test]
fn sasi_prefix_mode_follows_the_column_type() {
    let decl = SchemaDecl::new().entity(
        user()
            .field(
                FieldDecl::new("email", "text")
                    .index(IndexDecl::sasi(SasiDecl::mode(SasiMode::Prefix))),
            )
            .field(
                FieldDecl::new("age", "int")
                    .index(IndexDecl::sasi(SasiDecl::mode(SasiMode::Prefix))),
            ),
    );
    let api = generate(&decl, Profile::Cassandra37);

    assert!(api.has("UserIndexSelect", "email_starts_with"));
    assert!(!api.has("UserIndexSelect", "email_gt"));

    assert!(api.has("UserIndexSelect", "age_eq"));
    assert!(!api.has("UserIndexSelect", "age_starts_with"));
    for method in ["age_gt", "age_gte", "age_lt", "age_lte"] {
        assert_eq!(api.returns("UserIndexSelect", method), "UserIndexSelectEnd");
        assert_eq!(api.returns("UserIndexSelectEnd", method), "Self");
    }
}

#[test]
fn sasi_indexes_are_rejected_below_3_7() {
    let decl = SchemaDecl::new().entity(
        user().field(
            FieldDecl::new("email", "text").index(IndexDecl::sasi(SasiDecl::mode(SasiMode::Prefix))),
        ),
    );
    let err = try_generate(&decl, Profile::Cassandra36).expect_err("SASI needs 3.7");

    assert_eq!(unavailable(err), (Feature::SasiIndex, Profile::Cassandra37));
}

#[test]
fn unindexed_entities_have_no_index_chain() {
    let api = generate(&users(), Profile::Dse51);

    assert!(!api.has_type("UserIndexSelect"));
    assert!(!api.has("UserManager", "index_select"));
}

//
// views, types, functions
//

#[test]
fn views_are_read_only_and_need_3_0() {
    let decl = users().entity(
        EntityDecl::new("UserByName")
            .view_of("User")
            .field(FieldDecl::new("name", "text").partition(0))
            .field(FieldDecl::new("id", "bigint").clustering(0, true))
            .field(FieldDecl::new("clust1", "int").clustering(1, true))
            .field(FieldDecl::new("clust2", "int").clustering(2, true)),
    );

    let err = try_generate(&decl, Profile::Cassandra22).expect_err("views need 3.0");
    assert!(err.to_string().contains("cassandra_3_0"));
    assert_eq!(unavailable(err), (Feature::MaterializedViews, Profile::Cassandra30));

    let api = generate(&decl, Profile::Cassandra30);
    assert_eq!(api.returns("UserByNameManager", "select"), "UserByNameSelectWhereName");
    assert!(!api.has("UserByNameManager", "insert"));
    assert!(!api.has("UserByNameManager", "delete"));
    assert!(!api.has_type("UserByNameUpdateSet"));
}

#[test]
fn user_types_become_column_values() {
    let decl = SchemaDecl::new()
        .udt(UdtDecl::new("Address").field("city", "text").field("zip", "int"))
        .entity(user().field(FieldDecl::new("home", "frozen<address>")));
    let file = try_generate(&decl, Profile::Cassandra30).expect("schema generates");

    let implements_column_value = file.items.iter().any(|item| match item {
        Item::Impl(item) => {
            type_name(&item.self_ty) == "Address"
                && item
                    .trait_
                    .as_ref()
                    .and_then(|(_, path, _)| path.segments.last())
                    .is_some_and(|segment| segment.ident == "ColumnValue")
        }
        _ => false,
    });
    assert!(implements_column_value);

    // whole-value assignment only, the type is frozen
    let api = Api::new(&file);
    assert!(api.has("UserUpdateSetOrWhere", "home_set"));
    assert!(!api.has("UserUpdateSetOrWhere", "home_city_set"));
}

#[test]
fn function_overloads_get_suffixes() {
    let decl = users()
        .function(FunctionDecl::new("score", "int").param("points", "int"))
        .function(FunctionDecl::new("score", "bigint").param("points", "bigint"));

    let err = try_generate(&decl, Profile::Cassandra21).expect_err("functions need 2.2");
    assert_eq!(unavailable(err), (Feature::UserFunctions, Profile::Cassandra22));

    let api = generate(&decl, Profile::Cassandra22);
    assert!(api.has("FunctionRegistry", "score_0"));
    assert!(api.has("FunctionRegistry", "score_1"));
    assert!(!api.has("FunctionRegistry", "score"));
    assert_eq!(api.returns("UserSelectWhereId", "with_function"), "Self");
}

#[test]
fn ddl_constants_follow_the_config() {
    let with_ddl = generate(&users(), Profile::Cassandra30);
    assert!(with_ddl.consts.contains("SCHEMA_STATEMENTS"));
    assert!(with_ddl.has("UserManager", "schema_statements"));

    let config = GeneratorConfig {
        emit_ddl: false,
        ..GeneratorConfig::default()
    };
    let tokens = generate_tokens(&users(), &config).expect("schema generates");
    let without = Api::new(&syn::parse2(tokens).expect("generated code parses"));
    assert!(without.consts.is_empty());
    assert!(!without.has("UserManager", "schema_statements"));
}

#[test]
fn invalid_schemas_produce_nothing() {
    let decl = SchemaDecl::new().entity(
        EntityDecl::new("Loose").field(FieldDecl::new("a", "int")),
    );

    assert!(matches!(
        try_generate(&decl, Profile::Cassandra30),
        Err(BuildError::Schema(_))
    ));
}

//
// profiles
//

proptest! {
    #[test]
    fn later_profiles_generate_a_superset(
        a in 0..PROFILE_CHAIN.len(),
        b in 0..PROFILE_CHAIN.len(),
    ) {
        let (low, high) = (a.min(b), a.max(b));
        let decl = SchemaDecl::new().entity(
            user().field(FieldDecl::new("tags", "set<text>").index(IndexDecl::native())),
        );

        let low = generate(&decl, PROFILE_CHAIN[low].profile);
        let high = generate(&decl, PROFILE_CHAIN[high].profile);

        prop_assert!(low.types.is_subset(&high.types));
        for (owner, methods) in &low.methods {
            for method in methods.keys() {
                prop_assert!(high.has(owner, method), "{owner}::{method} disappeared");
            }
        }
    }
}
