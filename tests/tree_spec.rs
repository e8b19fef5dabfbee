use canopy::db::{Database, SpaceRepository, TreeRepository, WorkItemRepository};
use canopy::models::*;
use canopy::tree::NodePath;
use speculate2::speculate;
use uuid::Uuid;

fn create_space(db: &Database, name: &str) -> Space {
    db.transaction(|tx| {
        SpaceRepository::new(tx).create(CreateSpaceInput {
            name: name.to_string(),
            description: None,
        })
    })
    .expect("Failed to create space")
}

fn root_iteration(db: &Database, space_id: Uuid) -> Iteration {
    db.transaction(|tx| SpaceRepository::new(tx).root::<Iteration>(space_id))
        .expect("Failed to load root iteration")
}

fn child_iteration(db: &Database, parent: &Iteration, name: &str) -> Iteration {
    db.transaction(|tx| {
        TreeRepository::<Iteration>::new(tx).create(Iteration {
            node: Node::new(parent.node.space_id, name, parent.node.child_path()),
            description: None,
            start_at: None,
            end_at: None,
            state: IterationState::New,
            user_active: false,
        })
    })
    .expect("Failed to create iteration")
}

fn ids(iterations: &[Iteration]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = iterations.iter().map(|i| i.node.id).collect();
    ids.sort();
    ids
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "spaces" {
        it "creates a root iteration and a root area named after the space" {
            let space = create_space(&db, "Platform");

            let (iteration, area) = db.transaction(|tx| {
                let spaces = SpaceRepository::new(tx);
                Ok((spaces.root::<Iteration>(space.id)?, spaces.root::<Area>(space.id)?))
            }).expect("Failed to load roots");

            assert_eq!(iteration.node.name, "Platform");
            assert!(iteration.node.path.is_root());
            assert_eq!(iteration.state, IterationState::New);
            assert_eq!(area.node.name, "Platform");
            assert!(area.node.path.is_root());
        }

        it "rejects a duplicate space name" {
            create_space(&db, "Platform");
            let err = db.transaction(|tx| {
                SpaceRepository::new(tx).create(CreateSpaceInput {
                    name: "Platform".to_string(),
                    description: None,
                })
            }).unwrap_err();

            assert!(err.is_conflict());
        }

        it "rejects a blank space name" {
            let err = db.transaction(|tx| {
                SpaceRepository::new(tx).create(CreateSpaceInput {
                    name: "   ".to_string(),
                    description: None,
                })
            }).unwrap_err();

            assert!(err.is_bad_parameter());
        }

        it "returns NotFound for an unknown space" {
            let err = db.transaction(|tx| SpaceRepository::new(tx).load(Uuid::new_v4())).unwrap_err();
            assert!(err.is_not_found());
        }
    }

    describe "tree repository" {
        describe "create" {
            it "stores the path given by the caller" {
                let space = create_space(&db, "S");
                let root = root_iteration(&db, space.id);
                let sprint = child_iteration(&db, &root, "Sprint 1");
                let hardening = child_iteration(&db, &sprint, "Hardening");

                assert_eq!(sprint.node.path, NodePath::from(vec![root.node.id]));
                assert_eq!(
                    hardening.node.path,
                    NodePath::from(vec![root.node.id, sprint.node.id])
                );
                assert_eq!(hardening.node.version, 0);

                let loaded = db.transaction(|tx| {
                    TreeRepository::<Iteration>::new(tx).load(hardening.node.id)
                }).expect("Failed to load");
                assert_eq!(loaded.node.path, hardening.node.path);
                assert_eq!(loaded.node.name, "Hardening");
            }

            it "rejects a blank name" {
                let space = create_space(&db, "S");
                let root = root_iteration(&db, space.id);
                let err = db.transaction(|tx| {
                    TreeRepository::<Area>::new(tx).create(Area {
                        node: Node::new(space.id, "", NodePath::from(vec![root.node.id])),
                    })
                }).unwrap_err();

                assert!(err.is_bad_parameter());
            }

            it "rejects a node in a space that does not exist" {
                let err = db.transaction(|tx| {
                    TreeRepository::<Area>::new(tx).create(Area {
                        node: Node::new(Uuid::new_v4(), "Orphan", NodePath::root()),
                    })
                }).unwrap_err();

                assert!(err.is_bad_parameter());
            }

            it "rejects a sibling with the same name" {
                let space = create_space(&db, "S");
                let root = root_iteration(&db, space.id);
                child_iteration(&db, &root, "Sprint 1");

                let err = db.transaction(|tx| {
                    TreeRepository::<Iteration>::new(tx).create(Iteration {
                        node: Node::new(space.id, "Sprint 1", root.node.child_path()),
                        description: None,
                        start_at: None,
                        end_at: None,
                        state: IterationState::New,
                        user_active: false,
                    })
                }).unwrap_err();

                assert!(err.is_conflict());
            }

            it "allows the same name under different parents" {
                let space = create_space(&db, "S");
                let root = root_iteration(&db, space.id);
                let a = child_iteration(&db, &root, "A");
                let b = child_iteration(&db, &root, "B");

                let under_a = child_iteration(&db, &a, "Week 1");
                let under_b = child_iteration(&db, &b, "Week 1");
                assert_ne!(under_a.node.id, under_b.node.id);
            }
        }

        describe "ancestors" {
            it "rejects an ancestor that does not exist" {
                let space = create_space(&db, "S");
                let root = root_iteration(&db, space.id);
                let err = db.transaction(|tx| {
                    TreeRepository::<Iteration>::new(tx).create(Iteration {
                        node: Node::new(
                            space.id,
                            "Dangling",
                            NodePath::from(vec![root.node.id, Uuid::new_v4()]),
                        ),
                        description: None,
                        start_at: None,
                        end_at: None,
                        state: IterationState::New,
                        user_active: false,
                    })
                }).unwrap_err();

                assert!(err.is_bad_parameter());
            }

            it "rejects an ancestor from another space" {
                let space = create_space(&db, "S");
                let other = create_space(&db, "Other");
                let other_root = root_iteration(&db, other.id);
                let foreign = child_iteration(&db, &other_root, "Foreign");

                let err = db.transaction(|tx| {
                    TreeRepository::<Iteration>::new(tx).create(Iteration {
                        node: Node::new(space.id, "Intruder", foreign.node.child_path()),
                        description: None,
                        start_at: None,
                        end_at: None,
                        state: IterationState::New,
                        user_active: false,
                    })
                }).unwrap_err();
                assert!(err.is_bad_parameter());

                let (under_foreign, in_space) = db.transaction(|tx| {
                    let repo = TreeRepository::<Iteration>::new(tx);
                    Ok((repo.load_children(foreign.node.id)?, repo.list(space.id)?))
                }).expect("Failed to load");
                assert!(under_foreign.is_empty());
                assert_eq!(in_space.len(), 1);
            }
        }

        describe "load" {
            it "returns NotFound for an unknown id" {
                let err = db.transaction(|tx| {
                    TreeRepository::<Iteration>::new(tx).load(Uuid::new_v4())
                }).unwrap_err();
                assert!(err.is_not_found());
            }

            it "skips unknown ids when loading several" {
                let space = create_space(&db, "S");
                let root = root_iteration(&db, space.id);
                let sprint = child_iteration(&db, &root, "Sprint 1");

                let loaded = db.transaction(|tx| {
                    TreeRepository::<Iteration>::new(tx).load_multiple(&[
                        root.node.id,
                        Uuid::new_v4(),
                        sprint.node.id,
                    ])
                }).expect("Failed to load");

                assert_eq!(ids(&loaded), ids(&[root, sprint]));
            }

            it "returns nothing for an empty id list" {
                let loaded = db.transaction(|tx| {
                    TreeRepository::<Iteration>::new(tx).load_multiple(&[])
                }).expect("Failed to load");
                assert!(loaded.is_empty());
            }
        }

        describe "load_children" {
            it "returns every descendant and nothing else" {
                let space = create_space(&db, "S");
                let root = root_iteration(&db, space.id);
                let release = child_iteration(&db, &root, "Release");
                let sprint = child_iteration(&db, &release, "Sprint");
                let week = child_iteration(&db, &sprint, "Week");
                let backlog = child_iteration(&db, &root, "Backlog");

                let other_space = create_space(&db, "Other");
                let other_root = root_iteration(&db, other_space.id);
                child_iteration(&db, &other_root, "Elsewhere");

                let (of_release, of_root, of_week) = db.transaction(|tx| {
                    let repo = TreeRepository::<Iteration>::new(tx);
                    Ok((
                        repo.load_children(release.node.id)?,
                        repo.load_children(root.node.id)?,
                        repo.load_children(week.node.id)?,
                    ))
                }).expect("Failed to load children");

                assert_eq!(ids(&of_release), ids(&[sprint.clone(), week.clone()]));
                assert_eq!(ids(&of_root), ids(&[release, sprint, week, backlog]));
                assert!(of_week.is_empty());
            }
        }

        describe "list" {
            it "returns all nodes of one space" {
                let space = create_space(&db, "S");
                let root = root_iteration(&db, space.id);
                let sprint = child_iteration(&db, &root, "Sprint 1");
                create_space(&db, "Other");

                let listed = db.transaction(|tx| {
                    TreeRepository::<Iteration>::new(tx).list(space.id)
                }).expect("Failed to list");

                assert_eq!(ids(&listed), ids(&[root, sprint]));
            }
        }

        describe "save" {
            it "bumps the version" {
                let space = create_space(&db, "S");
                let root = root_iteration(&db, space.id);
                let mut sprint = child_iteration(&db, &root, "Sprint 1");
                sprint.description = Some("First".to_string());

                let saved = db.transaction(|tx| {
                    TreeRepository::<Iteration>::new(tx).save(sprint)
                }).expect("Failed to save");

                assert_eq!(saved.node.version, 1);
                assert_eq!(saved.description.as_deref(), Some("First"));
            }

            it "rejects a stale version" {
                let space = create_space(&db, "S");
                let root = root_iteration(&db, space.id);
                let sprint = child_iteration(&db, &root, "Sprint 1");

                let mut first = sprint.clone();
                first.node.name = "Renamed".to_string();
                db.transaction(|tx| TreeRepository::<Iteration>::new(tx).save(first))
                    .expect("Failed to save");

                let mut stale = sprint;
                stale.node.name = "Stale".to_string();
                let err = db.transaction(|tx| {
                    TreeRepository::<Iteration>::new(tx).save(stale)
                }).unwrap_err();

                assert!(err.is_conflict());
            }

            it "returns NotFound when saving a deleted node" {
                let space = create_space(&db, "S");
                let root = root_iteration(&db, space.id);
                let sprint = child_iteration(&db, &root, "Sprint 1");
                db.transaction(|tx| {
                    TreeRepository::<Iteration>::new(tx).delete_many(&[sprint.node.id])
                }).expect("Failed to delete");

                let err = db.transaction(|tx| {
                    TreeRepository::<Iteration>::new(tx).save(sprint)
                }).unwrap_err();

                assert!(err.is_not_found());
            }
        }
    }

    describe "delete" {
        it "removes a single node" {
            let space = create_space(&db, "S");
            let root = root_iteration(&db, space.id);
            let sprint = child_iteration(&db, &root, "Sprint 1");

            db.transaction(|tx| TreeRepository::<Iteration>::new(tx).delete(sprint.node.id))
                .expect("Failed to delete");

            let found = db.transaction(|tx| {
                TreeRepository::<Iteration>::new(tx).find(sprint.node.id)
            }).expect("Failed to query");
            assert!(found.is_none());
        }

        it "returns NotFound for an unknown id" {
            let err = db.transaction(|tx| {
                TreeRepository::<Area>::new(tx).delete(Uuid::new_v4())
            }).unwrap_err();
            assert!(err.is_not_found());
        }
    }

    describe "work items" {
        it "defaults to the root iteration and root area" {
            let space = create_space(&db, "S");
            let item = db.transaction(|tx| {
                WorkItemRepository::new(tx).create(space.id, CreateWorkItemInput {
                    title: "Fix login".to_string(),
                    ..Default::default()
                })
            }).expect("Failed to create work item");

            let (iteration, area) = db.transaction(|tx| {
                let spaces = SpaceRepository::new(tx);
                Ok((spaces.root::<Iteration>(space.id)?, spaces.root::<Area>(space.id)?))
            }).expect("Failed to load roots");

            assert_eq!(item.iteration_id, iteration.node.id);
            assert_eq!(item.area_id, area.node.id);
            assert_eq!(item.state, WorkItemState::New);
        }

        it "rejects a container from another space" {
            let space = create_space(&db, "S");
            let other = create_space(&db, "Other");
            let foreign = root_iteration(&db, other.id);

            let err = db.transaction(|tx| {
                WorkItemRepository::new(tx).create(space.id, CreateWorkItemInput {
                    title: "Misplaced".to_string(),
                    iteration_id: Some(foreign.node.id),
                    ..Default::default()
                })
            }).unwrap_err();

            assert!(err.is_bad_parameter());
        }

        it "moves between iterations on update" {
            let space = create_space(&db, "S");
            let root = root_iteration(&db, space.id);
            let sprint = child_iteration(&db, &root, "Sprint 1");

            let moved = db.transaction(|tx| {
                let items = WorkItemRepository::new(tx);
                let item = items.create(space.id, CreateWorkItemInput {
                    title: "Fix login".to_string(),
                    ..Default::default()
                })?;
                items.update(item.id, UpdateWorkItemInput {
                    state: Some(WorkItemState::Closed),
                    iteration_id: Some(sprint.node.id),
                    ..Default::default()
                })
            }).expect("Failed to update work item");

            assert_eq!(moved.iteration_id, sprint.node.id);
            assert_eq!(moved.state, WorkItemState::Closed);
            assert_eq!(moved.version, 1);
        }
    }
}
