use stackforge::db::Database;
use stackforge::models::*;
use speculate2::speculate;

fn create_test_project(db: &Database, name: &str) -> Project {
    db.create_project(CreateProjectInput {
        name: name.to_string(),
        ..Default::default()
    })
    .expect("Failed to create project")
}

fn create_rule(db: &Database, name: &str) -> Resource {
    db.create_resource(CreateResourceInput {
        name: name.to_string(),
        description: None,
        content: ResourceContent::Rule(RuleSpec {
            text: format!("{} applies", name),
            category: "style".to_string(),
        }),
    })
    .expect("Failed to create rule")
}

fn create_agent(db: &Database, name: &str) -> Resource {
    db.create_resource(CreateResourceInput {
        name: name.to_string(),
        description: None,
        content: ResourceContent::Agent(AgentSpec {
            role: "reviewer".to_string(),
            ..Default::default()
        }),
    })
    .expect("Failed to create agent")
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "projects" {
        describe "create_project" {
            it "derives a slug from the name" {
                let project = create_test_project(&db, "My Cool Project");

                assert_eq!(project.slug, "my-cool-project");
                assert_eq!(project.status, ProjectStatus::Draft);
                assert!(project.tags.is_empty());
            }

            it "keeps all provided fields" {
                let project = db.create_project(CreateProjectInput {
                    name: "Full".to_string(),
                    slug: Some("full-project".to_string()),
                    description: Some("A complete project".to_string()),
                    status: Some(ProjectStatus::Active),
                    priority: Some(3),
                    tags: vec!["rust".to_string()],
                    ai_context: Some("cli tool".to_string()),
                }).expect("Failed to create project");

                let found = db.get_project(project.id).unwrap().unwrap();
                assert_eq!(found.slug, "full-project");
                assert_eq!(found.status, ProjectStatus::Active);
                assert_eq!(found.priority, 3);
                assert_eq!(found.tags, vec!["rust".to_string()]);
                assert_eq!(found.ai_context, Some("cli tool".to_string()));
            }

            it "rejects an empty name" {
                let result = db.create_project(CreateProjectInput {
                    name: "   ".to_string(),
                    ..Default::default()
                });
                assert!(result.is_err());
            }

            it "rejects a duplicate slug" {
                create_test_project(&db, "Same Name");
                assert!(db.create_project(CreateProjectInput {
                    name: "Same  name".to_string(),
                    ..Default::default()
                }).is_err());
            }
        }

        describe "lookup" {
            it "returns None for a missing project" {
                assert!(db.get_project(999).unwrap().is_none());
            }

            it "finds a project by id or slug" {
                let project = create_test_project(&db, "Lookup Me");

                assert_eq!(db.find_project(&project.id.to_string()).unwrap().unwrap().id, project.id);
                assert_eq!(db.find_project("lookup-me").unwrap().unwrap().id, project.id);
                assert!(db.find_project("nope").unwrap().is_none());
            }

            it "lists projects ordered by name" {
                create_test_project(&db, "Zebra");
                create_test_project(&db, "Alpha");

                let names: Vec<String> = db.get_all_projects().unwrap().into_iter().map(|p| p.name).collect();
                assert_eq!(names, vec!["Alpha".to_string(), "Zebra".to_string()]);
            }
        }

        describe "update_project" {
            it "updates only the provided fields" {
                let project = create_test_project(&db, "Before");

                let updated = db.update_project(project.id, UpdateProjectInput {
                    status: Some(ProjectStatus::OnHold),
                    ..Default::default()
                }).unwrap().unwrap();

                assert_eq!(updated.name, "Before");
                assert_eq!(updated.status, ProjectStatus::OnHold);
                assert!(updated.updated_at >= project.updated_at);
            }

            it "returns None for a missing project" {
                assert!(db.update_project(42, UpdateProjectInput::default()).unwrap().is_none());
            }
        }

        describe "delete_project" {
            it "removes assignments and overrides but keeps export history" {
                use stackforge::assembly::{ExportAssembler, ResourceAssigner};

                let project = create_test_project(&db, "Doomed");
                let agent = create_agent(&db, "Solo");
                ResourceAssigner::new(&db)
                    .assign(project.id, agent.reference(), AssignOptions::default())
                    .unwrap();
                ExportAssembler::new(&db).export(project.id).unwrap();

                assert!(db.delete_project(project.id).unwrap());

                assert!(db.get_project(project.id).unwrap().is_none());
                assert!(db.get_assignments(project.id).unwrap().is_empty());
                assert_eq!(db.get_export_records(project.id).unwrap().len(), 1);
                assert!(db.get_resource(agent.id).unwrap().is_some());
            }
        }
    }

    describe "resources" {
        it "creates and reads back typed content" {
            let created = create_agent(&db, "Reviewer");

            let found = db.get_resource(created.id).unwrap().unwrap();
            assert_eq!(found.resource_type(), ResourceType::Agent);
            assert_eq!(found.content, created.content);
        }

        it "filters the list by type" {
            create_agent(&db, "A");
            create_rule(&db, "R1");
            create_rule(&db, "R2");

            assert_eq!(db.get_all_resources(None).unwrap().len(), 3);
            assert_eq!(db.get_all_resources(Some(ResourceType::Rule)).unwrap().len(), 2);
            assert!(db.get_all_resources(Some(ResourceType::Hook)).unwrap().is_empty());
        }

        it "rejects invalid content" {
            let result = db.create_resource(CreateResourceInput {
                name: "Empty hook".to_string(),
                description: None,
                content: ResourceContent::Hook(HookSpec {
                    trigger: HookTrigger::Stop,
                    matcher: None,
                    action: "".to_string(),
                    timeout_secs: None,
                }),
            });
            assert!(result.is_err());
        }

        it "refuses to change a resource's type" {
            let rule = create_rule(&db, "Fixed");

            let result = db.update_resource(rule.id, UpdateResourceInput {
                content: Some(ResourceContent::Agent(AgentSpec {
                    role: "x".to_string(),
                    ..Default::default()
                })),
                ..Default::default()
            });
            assert!(result.is_err());
        }

        it "updates the name in place" {
            let rule = create_rule(&db, "Old");

            let updated = db.update_resource(rule.id, UpdateResourceInput {
                name: Some("New".to_string()),
                ..Default::default()
            }).unwrap().unwrap();

            assert_eq!(updated.name, "New");
            assert_eq!(updated.content, rule.content);
        }

        it "refuses to delete an assigned resource" {
            use stackforge::assembly::ResourceAssigner;

            let project = create_test_project(&db, "Holder");
            let rule = create_rule(&db, "Pinned");
            ResourceAssigner::new(&db)
                .assign(project.id, rule.reference(), AssignOptions::default())
                .unwrap();

            assert!(db.delete_resource(rule.id).is_err());
            assert!(db.get_resource(rule.id).unwrap().is_some());
        }

        it "deletes an unassigned resource with its edges" {
            let a = create_rule(&db, "A");
            let b = create_rule(&db, "B");
            db.create_edge(CreateEdgeInput {
                source: a.reference(),
                target: b.reference(),
                kind: EdgeKind::Requires,
                critical: true,
            }).unwrap();

            assert!(db.delete_resource(b.id).unwrap());
            assert!(db.get_all_edges().unwrap().is_empty());
        }
    }

    describe "edges" {
        it "rejects self-edges" {
            let a = create_rule(&db, "A");
            let result = db.create_edge(CreateEdgeInput {
                source: a.reference(),
                target: a.reference(),
                kind: EdgeKind::Requires,
                critical: true,
            });
            assert!(result.is_err());
        }

        it "rejects duplicates of the same kind" {
            let a = create_rule(&db, "A");
            let b = create_rule(&db, "B");
            let input = CreateEdgeInput {
                source: a.reference(),
                target: b.reference(),
                kind: EdgeKind::Enhances,
                critical: false,
            };

            db.create_edge(input.clone()).unwrap();
            assert!(db.create_edge(input).is_err());
            assert!(db.create_edge(CreateEdgeInput {
                source: a.reference(),
                target: b.reference(),
                kind: EdgeKind::Conflicts,
                critical: false,
            }).is_ok());
        }

        it "rejects a mistyped endpoint" {
            let a = create_rule(&db, "A");
            let b = create_rule(&db, "B");
            let result = db.create_edge(CreateEdgeInput {
                source: a.reference(),
                target: ResourceRef::agent(b.id),
                kind: EdgeKind::Requires,
                critical: true,
            });
            assert!(result.is_err());
        }

        it "deletes by id" {
            let a = create_rule(&db, "A");
            let b = create_rule(&db, "B");
            let edge = db.create_edge(CreateEdgeInput {
                source: a.reference(),
                target: b.reference(),
                kind: EdgeKind::Requires,
                critical: false,
            }).unwrap();

            assert!(db.delete_edge(edge.id).unwrap());
            assert!(!db.delete_edge(edge.id).unwrap());
        }
    }

    describe "migrations" {
        it "can run twice" {
            db.migrate().expect("Second migration run failed");
        }
    }
}
